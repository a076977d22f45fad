use serde::{Deserialize, Serialize};

/// a file to copy from the machine preparing the job into the job's folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CopySpec {
    pub source: String,
    pub target: String,
}

/// a file to copy or link from elsewhere on the computer running the job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteCopySpec {
    pub computer: String,
    pub source: String,
    pub target: String,
}

/// how to invoke one executable within a job
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CodeInfo {
    pub cmdline_params: Vec<String>,
    pub stdout_name: String,
    pub code_uuid: String,
}

/// CalcInfo describes a prepared job to the host that will run it: the
/// command-line arguments, where standard input and output go, what to stage
/// into the job's folder, and what to retrieve once it has finished
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CalcInfo {
    pub uuid: String,
    pub cmdline_params: Vec<String>,
    pub stdin_name: String,
    pub stdout_name: String,
    pub local_copy_list: Vec<CopySpec>,
    pub remote_copy_list: Vec<RemoteCopySpec>,
    pub remote_symlink_list: Vec<RemoteCopySpec>,
    pub retrieve_list: Vec<String>,
    pub codes_info: Vec<CodeInfo>,
}
