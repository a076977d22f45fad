use std::path::Path;

use thiserror::Error;

use crate::{data::Inputs, job::CalcInfo};

pub mod cp2k;

/// Everything that can go wrong while preparing a calculation. Apart from
/// `Io`, all of these are raised before any file is written.
#[derive(Debug, Error)]
pub enum Error {
    #[error("no {0} specified for this calculation")]
    MissingRole(String),

    #[error("{role} is not of type {expected} (found {found})")]
    WrongType {
        role: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("the following input data nodes are unrecognized: {}", .0.join(", "))]
    UnrecognizedRoles(Vec<String>),

    #[error(
        "the following keys have been found in the settings input node, \
	 but were not understood: {}",
        .0.join(",")
    )]
    UnrecognizedSettings(Vec<String>),

    #[error("the settings key {key} must be {expected}")]
    InvalidSetting { key: String, expected: &'static str },

    #[error(
        "inside the dictionary '{name}' there are the following keys that \
	 are repeated more than once when compared case-insensitively: {}",
        .keys.join(", ")
    )]
    DuplicateKeys { name: String, keys: Vec<String> },

    #[error("{0} must be a section to hold the structure")]
    NotASection(String),

    #[error("the label of section {section} must be a single token, not a {found}")]
    InvalidLabel {
        section: String,
        found: &'static str,
    },

    #[error("neither element of the pair given for {key} is a number: ({first}, {second})")]
    MalformedPair {
        key: String,
        first: String,
        second: String,
    },

    #[error("failed to write input file: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// The collaborator that reads a calculation's outputs after it has run. The
/// assembler only cares about one thing a parser can say: which settings key,
/// if any, it reserves for its own options.
pub trait ResultParser {
    /// the (uppercase) settings key holding options for this parser
    fn settings_key(&self) -> &str;
}

/// A calculation plugin: turns the inputs a host links into a calculation into
/// files in `folder` and a [CalcInfo] describing how to run them.
pub trait Calculation {
    /// the name of the main input file written into the folder
    fn input_file(&self) -> &str;

    /// the name of the file the program's standard output goes to
    fn output_file(&self) -> &str;

    /// the parser attached to this calculation, if any
    fn parser(&self) -> Option<&dyn ResultParser> {
        None
    }

    /// validate `inputs`, write the input file(s) into `folder`, and describe
    /// the job
    fn prepare_for_submission(
        &self,
        folder: &Path,
        inputs: Inputs,
    ) -> Result<CalcInfo>;
}
