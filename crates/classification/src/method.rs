//! Supported classification methods.

use std::fmt;
use std::str::FromStr;

use crate::error::ClassifyError;

/// A statistical classification method.
///
/// Names are matched verbatim, so `"EqualInterval"` is accepted while
/// `"equal_interval"` is not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    BoxPlot,
    EqualInterval,
    FisherJenks,
    FisherJenksSampled,
    HeadTailBreaks,
    JenksCaspall,
    JenksCaspallForced,
    JenksCaspallSampled,
    MaxP,
    MaximumBreaks,
    NaturalBreaks,
    Percentiles,
    PrettyBreaks,
    Quantiles,
    StdMean,
    UserDefined,
}

/// Which parameter a method takes besides the values themselves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterKind {
    /// A target number of classes (`k`).
    ClassCount,
    /// An explicit sequence of edges (percentiles or bin bounds).
    Edges,
    /// Nothing; the number of classes follows from the data.
    DataDriven,
}

impl Method {
    /// All supported methods, in alphabetical order.
    pub const ALL: [Method; 16] = [
        Method::BoxPlot,
        Method::EqualInterval,
        Method::FisherJenks,
        Method::FisherJenksSampled,
        Method::HeadTailBreaks,
        Method::JenksCaspall,
        Method::JenksCaspallForced,
        Method::JenksCaspallSampled,
        Method::MaxP,
        Method::MaximumBreaks,
        Method::NaturalBreaks,
        Method::Percentiles,
        Method::PrettyBreaks,
        Method::Quantiles,
        Method::StdMean,
        Method::UserDefined,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Method::BoxPlot => "BoxPlot",
            Method::EqualInterval => "EqualInterval",
            Method::FisherJenks => "FisherJenks",
            Method::FisherJenksSampled => "FisherJenksSampled",
            Method::HeadTailBreaks => "HeadTailBreaks",
            Method::JenksCaspall => "JenksCaspall",
            Method::JenksCaspallForced => "JenksCaspallForced",
            Method::JenksCaspallSampled => "JenksCaspallSampled",
            Method::MaxP => "MaxP",
            Method::MaximumBreaks => "MaximumBreaks",
            Method::NaturalBreaks => "NaturalBreaks",
            Method::Percentiles => "Percentiles",
            Method::PrettyBreaks => "PrettyBreaks",
            Method::Quantiles => "Quantiles",
            Method::StdMean => "StdMean",
            Method::UserDefined => "UserDefined",
        }
    }

    pub fn parameter_kind(&self) -> ParameterKind {
        match self {
            Method::Percentiles | Method::UserDefined => ParameterKind::Edges,
            Method::HeadTailBreaks | Method::StdMean | Method::BoxPlot => {
                ParameterKind::DataDriven
            }
            _ => ParameterKind::ClassCount,
        }
    }

    /// Whether the caller supplies edges whose count fixes the number of classes.
    pub fn takes_edges(&self) -> bool {
        self.parameter_kind() == ParameterKind::Edges
    }
}

impl FromStr for Method {
    type Err = ClassifyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Method::ALL
            .iter()
            .copied()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| ClassifyError::UnknownMethod(s.to_string()))
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
