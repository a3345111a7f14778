//! Type definitions for requests and reports

pub mod input;
pub mod report;

pub use input::{AnalysisRequest, Gender, Platform, UserInput};
pub use report::{AnalysisReport, MentalStatus, OutputLine};
