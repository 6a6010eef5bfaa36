use std::collections::BTreeSet;

use serde_json::{Map, Value};

use crate::models::{SemesterEntry, StudentDetails, SubjectRecord};

// Key tables for the identity attributes, in probe priority order. The API
// has gone through several naming conventions and old documents still carry
// the old spellings.
const NAME_KEYS: &[&str] = &["NAME", "Name", "name"];
const ROLL_NUMBER_KEYS: &[&str] = &["rollNumber", "Roll_No", "rollNo", "htno"];
const COLLEGE_CODE_KEYS: &[&str] = &["collegeCode", "COLLEGE_CODE"];
const FATHER_NAME_KEYS: &[&str] = &["fatherName", "FATHER_NAME"];

// Aggregate and SGPA lookup tables on the results object.
const OVERALL_CGPA_KEYS: &[&str] = &["Total", "total", "CGPA", "cgpa"];
const SGPA_MAP_KEYS: &[&str] = &["semesterSGPA", "SGPA", "sgpa"];
const NESTED_SGPA_KEYS: &[&str] = &["SGPA", "sgpa", "Cgpa", "CGPA"];

// Top-level keys of the results object that are never semester identifiers.
const NON_SEMESTER_KEYS: &[&str] = &[
    "Total",
    "total",
    "CGPA",
    "cgpa",
    "credits",
    "grades",
    "backlogs",
    "Details",
    "details",
    "semesterSGPA",
    "semesters",
];

// Grades that count as a backlog. "Ab" and "AB" are listed separately
// because the API emits both spellings.
const FAIL_GRADES: &[&str] = &["F", "Ab", "AB", "ABSENT", "FAIL"];

pub const NO_RESULTS_MESSAGE: &str = "❌ No results found for this roll number.";

const PLACEHOLDER: &str = "unknown";
const SECTION_RULE: &str = "━━━━━━━━━━━━━━━━━━━━━";

// Returns the first key among `keys` that is present on `object` with a
// non-null value. Works on any JSON value; non-objects never match.
fn probe<'a>(object: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| object.get(key))
        .find(|value| !value.is_null())
}

// Probes and renders in one go, falling back to a placeholder so that an
// unresolved attribute still shows up on its line instead of vanishing.
fn probe_text(object: &Value, keys: &[&str]) -> String {
    probe(object, keys)
        .map(display)
        .unwrap_or_else(|| PLACEHOLDER.to_string())
}

// Scalar display form: strings print bare, everything else prints as JSON.
fn display(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

// Null, false, zero and the empty string all read as "missing". A zero
// SGPA therefore prints as N/A.
fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

fn document_details(doc: &Value) -> Option<&Value> {
    probe(doc, &["Details", "details"])
}

fn document_results(doc: &Value) -> Option<&Value> {
    probe(doc, &["Results", "results"])
}

// The message handler only offers a result summary (and its backlog button)
// when the document carries an identity block under either spelling.
pub fn has_details(doc: &Value) -> bool {
    document_details(doc).is_some()
}

// Resolves the identity header from whichever key spellings the document uses.
fn student_details(details: &Value) -> StudentDetails {
    StudentDetails {
        name: probe_text(details, NAME_KEYS),
        roll_number: probe_text(details, ROLL_NUMBER_KEYS),
        college_code: probe_text(details, COLLEGE_CODE_KEYS),
        father_name: probe_text(details, FATHER_NAME_KEYS),
    }
}

// Normalizes either results shape into one ordered semester list. The
// structured shape keeps its source order; the legacy fallback sorts keys
// lexicographically, so "10-1" lands before "2-1".
fn semester_entries(results: &Value) -> Vec<SemesterEntry> {
    if let Some(semesters) = results.get("semesters").and_then(Value::as_array) {
        return semesters
            .iter()
            .map(|semester| SemesterEntry {
                semester: semester
                    .get("semester")
                    .map(display)
                    .unwrap_or_else(|| PLACEHOLDER.to_string()),
                sgpa: semester.get("semesterSGPA").cloned(),
            })
            .collect();
    }

    // Legacy documents: SGPA lives in a dedicated map, or scattered under
    // per-semester keys at the top level of the results object.
    let empty = Map::new();
    let sgpa_map = probe(results, SGPA_MAP_KEYS)
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let mut keys: Vec<&String> = sgpa_map.keys().collect();
    if keys.is_empty() {
        if let Some(object) = results.as_object() {
            keys = object
                .keys()
                .filter(|key| !NON_SEMESTER_KEYS.contains(&key.as_str()))
                .collect();
        }
    }

    // Deduplicated, non-empty, ascending.
    let keys: BTreeSet<&String> = keys.into_iter().filter(|key| !key.is_empty()).collect();

    keys.into_iter()
        .map(|semester| SemesterEntry {
            semester: semester.clone(),
            sgpa: resolve_legacy_sgpa(results, sgpa_map, semester),
        })
        .collect()
}

// Legacy SGPA lookup order: the dedicated map wins, then the nested
// per-semester object, then the first element of a nested array.
fn resolve_legacy_sgpa(
    results: &Value,
    sgpa_map: &Map<String, Value>,
    semester: &str,
) -> Option<Value> {
    let mut sgpa = sgpa_map.get(semester).cloned();

    if sgpa.as_ref().map_or(true, is_falsy) {
        if let Some(nested) = results.get(semester) {
            if let Some(value) = probe(nested, NESTED_SGPA_KEYS) {
                sgpa = Some(value.clone());
            }
            if let Some(first) = nested.as_array().and_then(|elements| elements.first()) {
                sgpa = probe(first, &["sgpa", "SGPA"]).cloned();
            }
        }
    }

    sgpa
}

// SGPA cells print N/A for anything missing-equivalent.
fn sgpa_text(sgpa: Option<&Value>) -> String {
    match sgpa {
        Some(value) if !is_falsy(value) => display(value),
        _ => "N/A".to_string(),
    }
}

// Turns a raw result document into the formatted summary shown in chat.
// Malformed input never errors here: a document without both an identity
// block and a results block short-circuits to a fixed notice, and anything
// else degrades field by field.
pub fn format_result(doc: &Value) -> String {
    let (Some(details), Some(results)) = (document_details(doc), document_results(doc)) else {
        return NO_RESULTS_MESSAGE.to_string();
    };

    let student = student_details(details);
    let mut message = format!(
        "📋 *Student Details*\n{SECTION_RULE}\n👤 Name: {}\n🎓 Roll No: {}\n🏫 College: {}\n👨‍👦 Father: {}\n",
        student.name, student.roll_number, student.college_code, student.father_name
    );

    let entries = semester_entries(results);
    if entries.is_empty() {
        message.push_str("⚠️ No semester results available yet.\n");
    } else {
        message.push_str(&format!("📊 *Semester Results*\n{SECTION_RULE}\n\n"));
        for entry in &entries {
            message.push_str(&format!("📌 *Semester {}*\n", entry.semester));
            message.push_str(&format!("   SGPA: {}\n\n", sgpa_text(entry.sgpa.as_ref())));
        }
    }

    // A structured value under the CGPA keys means we grabbed a nested
    // object, not an overall score; skip it rather than print JSON.
    if let Some(total) = probe(results, OVERALL_CGPA_KEYS) {
        if !is_falsy(total) && !total.is_object() && !total.is_array() {
            message.push_str(&format!("{SECTION_RULE}\n"));
            message.push_str(&format!("🏆 *Overall CGPA: {}*\n", display(total)));
        }
    }

    if let Some(credits) = results.get("credits") {
        if !is_falsy(credits) {
            message.push_str(&format!("📚 Total Credits: {}\n", display(credits)));
        }
    }

    // Backlog count renders whenever the key exists, zero included.
    if let Some(backlogs) = results.get("backlogs") {
        message.push_str(&format!("⚠️ Backlogs: {}\n", display(backlogs)));
    }

    message.push_str("\n✅ Results fetched successfully!");
    message
}

// Builds the backlog report for a document the caller has already screened
// for identity and results blocks. Only the structured shape carries
// per-subject grades; legacy documents therefore always read as backlog-free
// here, a known false negative for old regulation years.
pub fn backlog_report(doc: &Value) -> String {
    let roll_number = document_details(doc)
        .map(|details| probe_text(details, &["rollNumber", "Roll_No"]))
        .unwrap_or_else(|| PLACEHOLDER.to_string());

    let mut report = format!("📜 *Backlog Report for {roll_number}*\n{SECTION_RULE}\n\n");
    let mut backlog_count = 0;

    let semesters = document_results(doc)
        .and_then(|results| results.get("semesters"))
        .and_then(Value::as_array);

    if let Some(semesters) = semesters {
        for semester in semesters {
            let failed = failed_subjects(semester);
            if failed.is_empty() {
                continue;
            }

            report.push_str(&format!(
                "📌 *Semester {}*\n",
                semester
                    .get("semester")
                    .map(display)
                    .unwrap_or_else(|| PLACEHOLDER.to_string())
            ));
            for subject in failed {
                backlog_count += 1;
                report.push_str(&format!(
                    "   ❌ {} ({})\n",
                    subject.subject_name, subject.subject_code
                ));
            }
            report.push('\n');
        }
    }

    if backlog_count == 0 {
        return format!(
            "🎉 *Congratulations!* \n\nNo backlogs found for Roll No: {roll_number}.\nYou are all clear! 🌟"
        );
    }

    report.push_str(&format!("{SECTION_RULE}\n"));
    report.push_str(&format!("⚠️ Total Backlogs: {backlog_count}"));
    report
}

// Subjects of one structured semester whose grade marks a backlog. Records
// that do not deserialize are skipped, the same as records with a passing
// grade.
fn failed_subjects(semester: &Value) -> Vec<SubjectRecord> {
    semester
        .get("subjects")
        .and_then(Value::as_array)
        .map(|subjects| {
            subjects
                .iter()
                .filter_map(|subject| serde_json::from_value::<SubjectRecord>(subject.clone()).ok())
                .filter(|subject| FAIL_GRADES.contains(&subject.grades.as_str()))
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn structured_document() -> Value {
        json!({
            "Details": {
                "NAME": "RAVI KUMAR",
                "rollNumber": "22A51A0501",
                "collegeCode": "A5",
                "fatherName": "SURESH KUMAR"
            },
            "Results": {
                "semesters": [
                    {
                        "semester": "1-1",
                        "semesterSGPA": "8.2",
                        "subjects": [
                            { "subjectName": "Mathematics - I", "subjectCode": "MA101", "grades": "A" }
                        ]
                    },
                    {
                        "semester": "1-2",
                        "semesterSGPA": "7.6",
                        "subjects": [
                            { "subjectName": "Data Structures", "subjectCode": "CS201", "grades": "F" },
                            { "subjectName": "Physics", "subjectCode": "PH102", "grades": "B" }
                        ]
                    }
                ],
                "Total": "7.9",
                "credits": 40,
                "backlogs": 1
            }
        })
    }

    #[test]
    fn missing_details_or_results_short_circuits() {
        assert_eq!(format_result(&json!({})), NO_RESULTS_MESSAGE);
        assert_eq!(
            format_result(&json!({ "Details": { "NAME": "X" } })),
            NO_RESULTS_MESSAGE
        );
        assert_eq!(format_result(&json!({ "results": {} })), NO_RESULTS_MESSAGE);
    }

    #[test]
    fn structured_semesters_render_in_source_order() {
        let doc = json!({
            "details": {},
            "results": {
                "semesters": [
                    { "semester": "2-1", "semesterSGPA": "8.0" },
                    { "semester": "1-1", "semesterSGPA": "6.4" },
                    { "semester": "1-2", "semesterSGPA": "7.5" }
                ]
            }
        });

        let message = format_result(&doc);
        assert_eq!(message.matches("📌 *Semester").count(), 3);

        let first = message.find("Semester 2-1").unwrap();
        let second = message.find("Semester 1-1").unwrap();
        let third = message.find("Semester 1-2").unwrap();
        assert!(first < second && second < third);
    }

    #[test]
    fn zero_empty_and_absent_sgpa_all_print_na() {
        let doc = json!({
            "details": {},
            "results": {
                "semesters": [
                    { "semester": "1-1", "semesterSGPA": 0 },
                    { "semester": "1-2", "semesterSGPA": "" },
                    { "semester": "2-1" }
                ]
            }
        });

        let message = format_result(&doc);
        assert_eq!(message.matches("SGPA: N/A").count(), 3);
    }

    #[test]
    fn legacy_keys_sort_lexicographically() {
        let doc = json!({
            "details": {},
            "results": { "1-2": 7.9, "1-1": 8.5 }
        });

        let message = format_result(&doc);
        assert!(message.find("Semester 1-1").unwrap() < message.find("Semester 1-2").unwrap());
    }

    #[test]
    fn legacy_sgpa_map_provides_values() {
        let doc = json!({
            "details": {},
            "results": { "semesterSGPA": { "1-2": "7.9", "1-1": "8.5" } }
        });

        let message = format_result(&doc);
        assert!(message.find("Semester 1-1").unwrap() < message.find("Semester 1-2").unwrap());
        assert!(message.contains("SGPA: 8.5"));
        assert!(message.contains("SGPA: 7.9"));
    }

    #[test]
    fn legacy_nested_object_and_array_resolve_sgpa() {
        let doc = json!({
            "details": {},
            "results": {
                "1-1": { "SGPA": "8.1" },
                "1-2": [ { "sgpa": "7.2" } ]
            }
        });

        let message = format_result(&doc);
        assert!(message.contains("SGPA: 8.1"));
        assert!(message.contains("SGPA: 7.2"));
    }

    #[test]
    fn empty_results_object_reports_no_semesters() {
        let message = format_result(&json!({ "details": {}, "results": {} }));
        assert!(message.contains("No semester results available yet"));
    }

    #[test]
    fn aggregates_render_after_semesters() {
        let message = format_result(&structured_document());
        assert!(message.contains("Overall CGPA: 7.9"));
        assert!(message.contains("Total Credits: 40"));
        assert!(message.contains("Backlogs: 1"));
        assert!(message.ends_with("✅ Results fetched successfully!"));
    }

    #[test]
    fn nested_total_object_is_not_reported_as_cgpa() {
        let doc = json!({
            "details": {},
            "results": { "semesters": [], "Total": { "CGPA": "8.0" } }
        });

        assert!(!format_result(&doc).contains("Overall CGPA"));
    }

    #[test]
    fn zero_backlog_count_still_renders() {
        let doc = json!({
            "details": {},
            "results": { "semesters": [], "backlogs": 0 }
        });

        assert!(format_result(&doc).contains("Backlogs: 0"));
    }

    #[test]
    fn identity_fields_probe_alternate_spellings() {
        let doc = json!({
            "Details": {
                "Name": "ANU",
                "htno": "18A51A0501",
                "COLLEGE_CODE": "A5",
                "FATHER_NAME": "RAJU"
            },
            "Results": { "semesters": [] }
        });

        let message = format_result(&doc);
        assert!(message.contains("Name: ANU"));
        assert!(message.contains("Roll No: 18A51A0501"));
        assert!(message.contains("College: A5"));
        assert!(message.contains("Father: RAJU"));
    }

    #[test]
    fn unresolved_identity_fields_keep_their_lines() {
        let message = format_result(&json!({ "details": {}, "results": { "semesters": [] } }));
        assert!(message.contains("Name: unknown"));
        assert!(message.contains("Roll No: unknown"));
    }

    #[test]
    fn backlog_report_lists_failed_subjects_and_count() {
        let report = backlog_report(&structured_document());
        assert!(report.contains("Backlog Report for 22A51A0501"));
        assert!(report.contains("Semester 1-2"));
        assert!(report.contains("Data Structures (CS201)"));
        assert!(report.contains("Total Backlogs: 1"));
        assert!(!report.contains("Semester 1-1"));
        assert!(!report.contains("Physics"));
    }

    #[test]
    fn clean_record_returns_congratulations_verbatim() {
        let doc = json!({
            "details": { "rollNumber": "22A51A0501" },
            "results": {
                "semesters": [
                    {
                        "semester": "1-1",
                        "subjects": [
                            { "subjectName": "Mathematics - I", "subjectCode": "MA101", "grades": "A+" }
                        ]
                    }
                ]
            }
        });

        assert_eq!(
            backlog_report(&doc),
            "🎉 *Congratulations!* \n\nNo backlogs found for Roll No: 22A51A0501.\nYou are all clear! 🌟"
        );
    }

    #[test]
    fn absence_grades_count_as_backlogs() {
        let doc = json!({
            "details": { "Roll_No": "18A51A0001" },
            "results": {
                "semesters": [
                    {
                        "semester": "2-1",
                        "subjects": [
                            { "subjectName": "Signals", "subjectCode": "EC301", "grades": "Ab" },
                            { "subjectName": "Networks", "subjectCode": "EC302", "grades": "ABSENT" }
                        ]
                    }
                ]
            }
        });

        let report = backlog_report(&doc);
        assert!(report.contains("Backlog Report for 18A51A0001"));
        assert!(report.contains("Signals (EC301)"));
        assert!(report.contains("Networks (EC302)"));
        assert!(report.contains("Total Backlogs: 2"));
    }

    #[test]
    fn lowercase_fail_grades_do_not_match() {
        let doc = json!({
            "details": { "rollNumber": "22A51A0501" },
            "results": {
                "semesters": [
                    {
                        "semester": "1-1",
                        "subjects": [
                            { "subjectName": "Chemistry", "subjectCode": "CH101", "grades": "f" }
                        ]
                    }
                ]
            }
        });

        assert!(backlog_report(&doc).contains("No backlogs found"));
    }

    #[test]
    fn legacy_documents_read_as_backlog_free() {
        let doc = json!({
            "details": { "rollNumber": "22A51A0501" },
            "results": { "1-1": 8.5 }
        });

        assert!(backlog_report(&doc).contains("No backlogs found"));
    }
}
