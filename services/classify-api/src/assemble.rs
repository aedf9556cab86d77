//! Joining a classification back onto the features of a layer.

use serde::Serialize;
use serde_json::{Map, Value};

use classification::Classification;
use geoserver_client::{Feature, FeatureCollection};

use crate::error::ApiError;

/// Numeric values of one column, with the row each value came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnValues {
    /// Feature indices, ascending.
    pub rows: Vec<usize>,
    pub values: Vec<f64>,
}

/// Collect the values of `column`, skipping features where it is null or
/// absent.
///
/// A column holding only booleans reads as 1.0 and 0.0. A column with no
/// non-null value at all, or with text or mixed kinds, is not numeric.
pub fn column_values(
    collection: &FeatureCollection,
    column: &str,
) -> Result<ColumnValues, ApiError> {
    if !collection.has_column(column) {
        return Err(ApiError::Validation(format!(
            "column '{column}' not found in layer"
        )));
    }

    let present: Vec<(usize, &Value)> = collection
        .features
        .iter()
        .enumerate()
        .filter_map(|(row, feature)| match feature.property(column) {
            None | Some(Value::Null) => None,
            Some(value) => Some((row, value)),
        })
        .collect();

    let all_bool = !present.is_empty() && present.iter().all(|(_, v)| v.is_boolean());
    let mut extracted = ColumnValues::default();
    for (row, value) in present {
        let number = match value {
            Value::Bool(b) if all_bool => Some(if *b { 1.0 } else { 0.0 }),
            Value::Number(n) => n.as_f64(),
            _ => None,
        };
        let number = number.ok_or_else(not_numeric)?;
        extracted.rows.push(row);
        extracted.values.push(number);
    }

    if extracted.values.is_empty() {
        return Err(not_numeric());
    }
    Ok(extracted)
}

fn not_numeric() -> ApiError {
    ApiError::Validation("column must be numeric".to_string())
}

/// One row of the per-class table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassEntry {
    pub class: usize,
    pub count: usize,
    pub range: [f64; 2],
    pub color: String,
    /// Legend text such as `(3.67, 6.33]`.
    pub label: String,
}

/// GeoJSON output of `/classify`: the classified features plus a `classes`
/// foreign member describing the legend.
#[derive(Debug, Clone, Serialize)]
pub struct ClassifiedCollection {
    #[serde(rename = "type")]
    pub type_: &'static str,
    pub features: Vec<Feature>,
    pub classes: Vec<ClassEntry>,
}

/// Pair every class with its color and label.
pub fn class_table(
    classification: &Classification,
    colors: &[String],
) -> Result<Vec<ClassEntry>, ApiError> {
    let labels = classification.legend_labels();
    classification
        .classes()
        .into_iter()
        .zip(labels)
        .map(|(class, label)| {
            let color = colors.get(class.index).ok_or_else(|| {
                ApiError::Preparation(format!(
                    "no color for class {} ({} colors for {} classes)",
                    class.index,
                    colors.len(),
                    classification.k()
                ))
            })?;
            Ok(ClassEntry {
                class: class.index,
                count: class.count,
                range: class.range(),
                color: color.clone(),
                label,
            })
        })
        .collect()
}

/// Build the output collection.
///
/// `rows[i]` is the feature that produced the i-th classified value. Output
/// features keep the layer's order; features without a value are dropped.
pub fn assemble(
    collection: FeatureCollection,
    rows: &[usize],
    classification: &Classification,
    colors: &[String],
) -> Result<ClassifiedCollection, ApiError> {
    let assignments = classification.assignments();
    if rows.len() != assignments.len() {
        return Err(ApiError::Preparation(format!(
            "{} classified values for {} rows",
            assignments.len(),
            rows.len()
        )));
    }

    let classes = class_table(classification, colors)?;

    let mut class_of_row: Vec<Option<usize>> = vec![None; collection.len()];
    for (&row, &class) in rows.iter().zip(assignments) {
        let slot = class_of_row
            .get_mut(row)
            .ok_or_else(|| ApiError::Preparation(format!("row {row} is out of range")))?;
        *slot = Some(class);
    }

    let features = collection
        .features
        .into_iter()
        .zip(class_of_row)
        .filter_map(|(feature, class)| class.map(|c| classified_feature(feature, &classes[c])))
        .collect();

    Ok(ClassifiedCollection {
        type_: "FeatureCollection",
        features,
        classes,
    })
}

fn classified_feature(source: Feature, entry: &ClassEntry) -> Feature {
    let mut properties = Map::new();
    properties.insert("class".to_string(), entry.class.into());
    properties.insert("count".to_string(), entry.count.into());
    properties.insert(
        "range".to_string(),
        Value::Array(entry.range.iter().map(|v| Value::from(*v)).collect()),
    );
    properties.insert("color".to_string(), entry.color.clone().into());

    let mut feature = Feature::new(source.geometry, properties);
    feature.id = source.id;
    feature
}

#[cfg(test)]
mod tests {
    use super::*;
    use classification::{classify, Method};
    use serde_json::json;

    fn layer(values: &[Value]) -> FeatureCollection {
        let features = values
            .iter()
            .enumerate()
            .map(|(i, v)| {
                let mut props = Map::new();
                props.insert("name".to_string(), json!(format!("f{i}")));
                props.insert("value".to_string(), v.clone());
                Feature::new(Some(json!({"type": "Point", "coordinates": [i, i]})), props)
                    .with_id(format!("layer.{i}"))
            })
            .collect();
        FeatureCollection::new(features)
    }

    fn colors(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("#00000{i}")).collect()
    }

    #[test]
    fn test_column_values_skip_nulls() {
        let fc = layer(&[json!(3), Value::Null, json!(1.5), json!(7)]);
        let extracted = column_values(&fc, "value").unwrap();
        assert_eq!(extracted.rows, vec![0, 2, 3]);
        assert_eq!(extracted.values, vec![3.0, 1.5, 7.0]);
    }

    #[test]
    fn test_column_values_rejects_text() {
        let fc = layer(&[json!(3), json!("n/a")]);
        let err = column_values(&fc, "name").unwrap_err();
        assert_eq!(err.to_string(), "column must be numeric");
        let err = column_values(&fc, "value").unwrap_err();
        assert_eq!(err.to_string(), "column must be numeric");
    }

    #[test]
    fn test_column_values_all_null_is_not_numeric() {
        let fc = layer(&[Value::Null, Value::Null]);
        let err = column_values(&fc, "value").unwrap_err();
        assert_eq!(err.to_string(), "column must be numeric");
    }

    #[test]
    fn test_column_values_reads_booleans() {
        let fc = layer(&[json!(true), Value::Null, json!(false), json!(true)]);
        let extracted = column_values(&fc, "value").unwrap();
        assert_eq!(extracted.rows, vec![0, 2, 3]);
        assert_eq!(extracted.values, vec![1.0, 0.0, 1.0]);
    }

    #[test]
    fn test_column_values_rejects_mixed_kinds() {
        let fc = layer(&[json!(true), json!(2.5)]);
        let err = column_values(&fc, "value").unwrap_err();
        assert_eq!(err.to_string(), "column must be numeric");
    }

    #[test]
    fn test_column_values_missing_column() {
        let fc = layer(&[json!(3)]);
        let err = column_values(&fc, "area").unwrap_err();
        assert_eq!(err.to_string(), "column 'area' not found in layer");
    }

    #[test]
    fn test_assemble_preserves_order_and_ids() {
        let fc = layer(&[json!(9), json!(1), Value::Null, json!(5)]);
        let extracted = column_values(&fc, "value").unwrap();
        let c = classify(&extracted.values, Method::EqualInterval, Some(2), None).unwrap();

        let out = assemble(fc, &extracted.rows, &c, &colors(2)).unwrap();
        assert_eq!(out.features.len(), 3);

        let ids: Vec<_> = out.features.iter().map(|f| f.id.clone().unwrap()).collect();
        assert_eq!(ids, vec![json!("layer.0"), json!("layer.1"), json!("layer.3")]);

        let classes: Vec<_> = out
            .features
            .iter()
            .map(|f| f.property("class").unwrap().as_u64().unwrap())
            .collect();
        assert_eq!(classes, vec![1, 0, 0]);
        assert_eq!(out.features[0].property("color"), Some(&json!("#000001")));
        assert_eq!(out.features[1].property("count"), Some(&json!(2)));
    }

    #[test]
    fn test_class_table_labels() {
        let values: Vec<f64> = (1..=9).map(f64::from).collect();
        let c = classify(&values, Method::EqualInterval, Some(3), None).unwrap();
        let table = class_table(&c, &colors(3)).unwrap();
        assert_eq!(table[0].label, "[1.00, 3.67]");
        assert_eq!(table[2].label, "(6.33, 9.00]");
        assert_eq!(table[1].color, "#000001");
    }

    #[test]
    fn test_too_few_colors() {
        let values = [1.0, 2.0, 3.0, 40.0];
        let c = classify(&values, Method::UserDefined, None, Some(&[2.0, 3.0])).unwrap();
        assert_eq!(c.k(), 3);
        let err = class_table(&c, &colors(2)).unwrap_err();
        assert!(err.to_string().starts_with("cannot prepare data: no color for class 2"));
    }

    #[test]
    fn test_serialized_shape() {
        let fc = layer(&[json!(1), json!(2)]);
        let extracted = column_values(&fc, "value").unwrap();
        let c = classify(&extracted.values, Method::UserDefined, None, Some(&[1.0, 2.0])).unwrap();
        let out = assemble(fc, &extracted.rows, &c, &colors(2)).unwrap();

        let json = serde_json::to_value(&out).unwrap();
        assert_eq!(json["type"], "FeatureCollection");
        assert_eq!(json["features"][0]["properties"]["range"], json!([1.0, 1.0]));
        assert_eq!(json["features"][1]["properties"]["range"], json!([1.0, 2.0]));
        assert_eq!(json["classes"][1]["count"], 1);
    }
}
