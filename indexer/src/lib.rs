//! Reading faculty records from files, directories and HTTP sources.

use finder_core::{Error, FacultyRecord, Result};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use walkdir::WalkDir;

/// Load every record from `input`: an http(s) URL, a `.json`/`.jsonl` file,
/// or a directory searched recursively for such files (in path order).
pub fn load_records(input: &str, timeout: Duration) -> Result<Vec<FacultyRecord>> {
    if input.starts_with("http://") || input.starts_with("https://") {
        let body = fetch_url(input, timeout)?;
        return parse_json(input, &body);
    }

    let input_path = Path::new(input);
    let mut files: Vec<PathBuf> = Vec::new();
    if input_path.is_dir() {
        for entry in WalkDir::new(input_path).sort_by_file_name() {
            let entry = entry.map_err(|e| Error::data_fetch(input, e))?;
            let p = entry.path();
            if p.is_file() && matches!(p.extension().and_then(|s| s.to_str()), Some("json" | "jsonl")) {
                files.push(p.to_path_buf());
            }
        }
    } else if input_path.is_file() {
        files.push(input_path.to_path_buf());
    } else {
        return Err(Error::data_fetch(input, "no such file or directory"));
    }

    let mut records = Vec::new();
    for file in files {
        let name = file.display().to_string();
        let text = fs::read_to_string(&file).map_err(|e| Error::data_fetch(&name, e))?;
        if file.extension().and_then(|s| s.to_str()) == Some("jsonl") {
            records.extend(parse_jsonl(&name, &text)?);
        } else {
            records.extend(parse_json(&name, &text)?);
        }
    }
    Ok(records)
}

fn fetch_url(url: &str, timeout: Duration) -> Result<String> {
    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::data_fetch(url, e))?;
    let resp = client.get(url).send().map_err(|e| Error::data_fetch(url, e))?;
    if !resp.status().is_success() {
        return Err(Error::data_fetch(url, format!("HTTP status {}", resp.status())));
    }
    resp.text().map_err(|e| Error::data_fetch(url, e))
}

/// Accepts `{"results": [...]}`, a bare array, or a single record object.
pub fn parse_json(source: &str, text: &str) -> Result<Vec<FacultyRecord>> {
    let json: Value = serde_json::from_str(text).map_err(|e| Error::data_fetch(source, e))?;
    let items = match json {
        Value::Object(mut obj) => match obj.remove("results") {
            Some(Value::Array(arr)) => arr,
            Some(_) => return Err(Error::data_fetch(source, "'results' must be a list")),
            None => vec![Value::Object(obj)],
        },
        Value::Array(arr) => arr,
        _ => return Err(Error::data_fetch(source, "expected a JSON object or array")),
    };
    items
        .into_iter()
        .enumerate()
        .map(|(i, v)| decode_record(source, i, v))
        .collect()
}

pub fn parse_jsonl(source: &str, text: &str) -> Result<Vec<FacultyRecord>> {
    let mut records = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() { continue; }
        let v: Value = serde_json::from_str(line)
            .map_err(|e| Error::data_fetch(source, format!("line {}: {e}", i + 1)))?;
        records.push(decode_record(source, i, v)?);
    }
    Ok(records)
}

fn decode_record(source: &str, i: usize, v: Value) -> Result<FacultyRecord> {
    if !v.is_object() {
        return Err(Error::data_fetch(source, format!("record {i} is not an object")));
    }
    FacultyRecord::from_json(v).map_err(|e| Error::data_fetch(source, format!("record {i}: {e}")))
}
