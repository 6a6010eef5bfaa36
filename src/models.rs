use serde::Deserialize;
use serde_json::Value;

// One row of the uniform semester list, whichever document shape produced it.
// The SGPA stays a raw JSON value because the API returns it as a string,
// a number or nothing at all depending on the regulation year.
#[derive(Debug, Clone)]
pub struct SemesterEntry {
    pub semester: String,
    pub sgpa: Option<Value>,
}

// The four identity attributes shown in the result header.
#[derive(Debug, Clone)]
pub struct StudentDetails {
    pub name: String,
    pub roll_number: String,
    pub college_code: String,
    pub father_name: String,
}

// A subject record from the structured document shape. Missing fields
// default to empty rather than dropping the record.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectRecord {
    #[serde(rename = "subjectName", default)]
    pub subject_name: String,
    #[serde(rename = "subjectCode", default)]
    pub subject_code: String,
    #[serde(default)]
    pub grades: String,
}
