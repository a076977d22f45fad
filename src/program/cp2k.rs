use std::{fs::File, io::Write, path::Path};

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{
    data::{uppercase_keys, Code, InputNode, Inputs, Param, ParameterData},
    geom::{Structure, CELL_VECTORS},
    job::{CalcInfo, CodeInfo},
};

use self::section::{Section, Value};
use super::{Calculation, Error, Result, ResultParser};

pub mod section;


/// the role names [Cp2k] recognizes in its [Inputs]
pub mod role {
    pub const PARAMETERS: &str = "parameters";
    pub const STRUCTURE: &str = "structure";
    pub const CODE: &str = "code";
    pub const SETTINGS: &str = "settings";
    pub const PARENT_FOLDER: &str = "parent_folder";
}

/// settings key holding extra file names to retrieve after the run
pub const RETRIEVE_LIST_KEY: &str = "ADDITIONAL_RETRIEVE_LIST";

/// settings key holding extra command-line arguments
pub const CMDLINE_KEY: &str = "CMDLINE";

/// the top-level section the structure is merged into
pub const FORCE_EVAL: &str = "FORCEVAL";

/// value written for per-kind fields nothing fills in yet
pub const UNRESOLVED: &str = "TODO";

/// the flag telling CP2K which file to read its input from
const INPUT_FLAG: &str = "-in";

fn default_input_file() -> String {
    String::from("aiida.in")
}

fn default_output_file() -> String {
    String::from("aiida.out")
}

/// Cp2k prepares a CP2K calculation. `input_file` is written into the folder
/// handed to [Calculation::prepare_for_submission] and passed to CP2K on the
/// command line; CP2K's standard output goes to `output_file`, which is always
/// retrieved.
#[derive(Serialize, Deserialize)]
pub struct Cp2k {
    /// identifier of the calculation, copied into the [CalcInfo]
    #[serde(default)]
    pub uuid: String,

    #[serde(default = "default_input_file")]
    pub input_file: String,

    #[serde(default = "default_output_file")]
    pub output_file: String,

    #[serde(skip)]
    parser: Option<Box<dyn ResultParser>>,
}

impl Default for Cp2k {
    fn default() -> Self {
        Self {
            uuid: String::new(),
            input_file: default_input_file(),
            output_file: default_output_file(),
            parser: None,
        }
    }
}

impl std::fmt::Debug for Cp2k {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cp2k")
            .field("uuid", &self.uuid)
            .field("input_file", &self.input_file)
            .field("output_file", &self.output_file)
            .field("parser", &self.parser.as_ref().map(|p| p.settings_key()))
            .finish()
    }
}

/// a [Cp2k] calculation together with the inputs linked into it, as read
/// from a JSON document like
///
/// ```json
/// {
///   "calculation": {"uuid": "6f1c2c9e"},
///   "inputs": {
///     "parameters": {"ParameterData": {"global": {"project": "BaTiO3"}}},
///     "structure": {"StructureData": {"cell": [...], "sites": [...]}},
///     "code": {"Code": {"uuid": "c0de"}}
///   }
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub calculation: Cp2k,
    pub inputs: Inputs,
}

/// what is left of the settings once the reserved keys have been consumed
#[derive(Debug, Default, PartialEq)]
struct Settings {
    retrieve_list: Vec<String>,
    cmdline: Vec<String>,
}

impl Cp2k {
    pub fn new(uuid: &str) -> Self {
        Self {
            uuid: uuid.to_owned(),
            ..Self::default()
        }
    }

    /// attach the parser that will read this calculation's output
    pub fn with_parser(mut self, parser: Box<dyn ResultParser>) -> Self {
        self.parser = Some(parser);
        self
    }

    /// Build the complete input tree: the case-normalized `parameters` with a
    /// `SUBSYS` section describing `structure` merged into [FORCE_EVAL]
    pub fn build_input(
        parameters: &ParameterData,
        structure: &Structure,
    ) -> Result<Section> {
        let parameters = uppercase_keys(parameters, role::PARAMETERS)?;
        let mut tree = Section::root(&parameters)?;
        let subsys = Value::Section(subsys(structure));
        match tree.get_mut(FORCE_EVAL) {
            Some(Value::Section(force_eval)) => {
                let old =
                    force_eval.entries.insert("SUBSYS".to_owned(), subsys);
                if let Some(old) = old {
                    warn!(
                        "replaced the SUBSYS given in {FORCE_EVAL} with one \
                         built from the structure, discarding {old:?}"
                    );
                }
            }
            Some(_) => {
                return Err(Error::NotASection(FORCE_EVAL.to_owned()))
            }
            None => {
                let mut force_eval = Section::new();
                force_eval.insert("SUBSYS", subsys);
                tree.insert(FORCE_EVAL, Value::Section(force_eval));
            }
        }
        Ok(tree)
    }

    /// Pop the reserved keys out of the case-normalized `settings` and fail if
    /// anything else is left. A parser that is absent, or whose key is not in
    /// the settings, is not an error.
    fn consume_settings(
        &self,
        mut settings: ParameterData,
    ) -> Result<Settings> {
        let retrieve_list = pop_strings(&mut settings, RETRIEVE_LIST_KEY)?;
        let cmdline = pop_strings(&mut settings, CMDLINE_KEY)?;
        if let Some(parser) = self.parser() {
            let key = parser.settings_key().to_uppercase();
            if settings.shift_remove(&key).is_some() {
                debug!("left {key} in settings for the parser");
            }
        }
        if !settings.is_empty() {
            return Err(Error::UnrecognizedSettings(
                settings.into_keys().collect(),
            ));
        }
        Ok(Settings {
            retrieve_list,
            cmdline,
        })
    }

    fn calc_info(&self, code: &Code, settings: Settings) -> CalcInfo {
        let Settings {
            retrieve_list,
            cmdline,
        } = settings;
        let input_file = self.input_file().to_owned();
        let output_file = self.output_file().to_owned();
        let mut cmdline_params = cmdline;
        cmdline_params.extend([INPUT_FLAG.to_owned(), input_file.clone()]);

        let mut retrieve = vec![output_file.clone()];
        retrieve.extend(retrieve_list);

        CalcInfo {
            uuid: self.uuid.clone(),
            cmdline_params: cmdline_params.clone(),
            stdin_name: input_file,
            stdout_name: output_file.clone(),
            local_copy_list: Vec::new(),
            remote_copy_list: Vec::new(),
            remote_symlink_list: Vec::new(),
            retrieve_list: retrieve,
            codes_info: vec![CodeInfo {
                cmdline_params,
                stdout_name: output_file,
                code_uuid: code.uuid.clone(),
            }],
        }
    }
}

impl Calculation for Cp2k {
    fn input_file(&self) -> &str {
        &self.input_file
    }

    fn output_file(&self) -> &str {
        &self.output_file
    }

    fn parser(&self) -> Option<&dyn ResultParser> {
        self.parser.as_deref()
    }

    fn prepare_for_submission(
        &self,
        folder: &Path,
        mut inputs: Inputs,
    ) -> Result<CalcInfo> {
        let parameters = match take(&mut inputs, role::PARAMETERS)? {
            InputNode::Parameters(p) => p,
            other => {
                return Err(wrong_type(role::PARAMETERS, "ParameterData", &other))
            }
        };
        let structure = match take(&mut inputs, role::STRUCTURE)? {
            InputNode::Structure(s) => s,
            other => {
                return Err(wrong_type(role::STRUCTURE, "StructureData", &other))
            }
        };
        let code = match take(&mut inputs, role::CODE)? {
            InputNode::Code(c) => c,
            other => return Err(wrong_type(role::CODE, "Code", &other)),
        };
        // settings can be left out, and default to an empty mapping
        let settings = match inputs.shift_remove(role::SETTINGS) {
            None => ParameterData::new(),
            Some(InputNode::Parameters(s)) => {
                uppercase_keys(&s, role::SETTINGS)?
            }
            Some(other) => {
                return Err(wrong_type(role::SETTINGS, "ParameterData", &other))
            }
        };
        match inputs.shift_remove(role::PARENT_FOLDER) {
            None => {}
            Some(InputNode::Remote(r)) => debug!(
                "parent folder {}:{} given but restarts are not wired up",
                r.computer, r.remote_path
            ),
            Some(other) => {
                return Err(wrong_type(
                    role::PARENT_FOLDER,
                    "RemoteData",
                    &other,
                ))
            }
        }
        // there should be nothing left
        if !inputs.is_empty() {
            return Err(Error::UnrecognizedRoles(inputs.into_keys().collect()));
        }

        let tree = Self::build_input(&parameters, &structure)?;
        let settings = self.consume_settings(settings)?;
        if !structure.is_empty() {
            warn!(
                "BASIS_SET and POTENTIAL of {} kind(s) left as {UNRESOLVED}",
                structure.len()
            );
        }

        let input_path = folder.join(self.input_file());
        {
            let body = tree.to_string();
            let mut file = File::create(&input_path)?;
            file.write_all(body.as_bytes())?;
            debug!("wrote {} bytes to {}", body.len(), input_path.display());
        }

        Ok(self.calc_info(&code, settings))
    }
}

fn take(inputs: &mut Inputs, role: &str) -> Result<InputNode> {
    inputs
        .shift_remove(role)
        .ok_or_else(|| Error::MissingRole(role.to_owned()))
}

fn wrong_type(role: &str, expected: &'static str, found: &InputNode) -> Error {
    Error::WrongType {
        role: role.to_owned(),
        expected,
        found: found.kind(),
    }
}

/// remove `key` from `settings`, requiring it to be a list of strings if
/// present
fn pop_strings(
    settings: &mut ParameterData,
    key: &str,
) -> Result<Vec<String>> {
    let invalid = || Error::InvalidSetting {
        key: key.to_owned(),
        expected: "a list of strings",
    };
    match settings.shift_remove(key) {
        None => Ok(Vec::new()),
        Some(Param::List(v)) => v
            .into_iter()
            .map(|p| p.as_str().map(str::to_owned).ok_or_else(invalid))
            .collect(),
        Some(_) => Err(invalid()),
    }
}

/// The `SUBSYS` section for `structure`: one `KIND` per site, in site order,
/// with the basis set and potential left [UNRESOLVED], the three lattice
/// vectors under `CELL`, and one `COORD` row per site
pub fn subsys(structure: &Structure) -> Section {
    let kinds = structure
        .kind_names()
        .map(|name| {
            let mut kind = Section::with_label(name);
            kind.insert("ELEMENT", Value::scalar(name))
                .insert("BASIS_SET", Value::scalar(UNRESOLVED))
                .insert("POTENTIAL", Value::scalar(UNRESOLVED));
            Value::Section(kind)
        })
        .collect();

    let mut cell = Section::new();
    for (name, [x, y, z]) in CELL_VECTORS.iter().zip(&structure.cell) {
        cell.insert(name, Value::scalar(format!("{x:<15} {y:<15} {z}")));
    }

    let mut coord = Section::new();
    for site in &structure.sites {
        let [x, y, z] = site.position;
        coord.push_row(format!(
            "{:<2} {:<15} {:<15} {}",
            site.kind_name, x, y, z
        ));
    }

    let mut ret = Section::new();
    ret.insert("KIND", Value::Repeated(kinds))
        .insert("CELL", Value::Section(cell))
        .insert("COORD", Value::Section(coord));
    ret
}
