use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;

pub const SAMPLES_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/samples");

/// The files making up one sample run
pub struct TestCasePaths {
    pub config: PathBuf,
    pub trace: PathBuf,
    pub output: PathBuf,
}

/// Finds every sample case under `samples/`
///
/// Each expected output `outputs/output-<trace>-<config>.json` names the run it belongs to, the
/// trace being `traces/<trace>.trace` and the configuration `inputs/<config>.cfg`. Cases come back
/// sorted by output file name
pub fn get_test_cases() -> Result<Vec<TestCasePaths>, Box<dyn Error>> {
    get_test_cases_in(Path::new(SAMPLES_PATH))
}

pub fn get_test_cases_in(samples: &Path) -> Result<Vec<TestCasePaths>, Box<dyn Error>> {
    let output_pattern = Regex::new(r"^output-(?P<trace>[0-9a-zA-Z_]+)-(?P<config>[0-9a-zA-Z_]+)\.json$")?;
    let mut file_names = Vec::new();
    for entry in fs::read_dir(samples.join("outputs"))? {
        let file_name = entry?
            .file_name()
            .into_string()
            .map_err(|e| format!("Can't convert OS string ({e:?}) to standard string"))?;
        if output_pattern.is_match(&file_name) {
            file_names.push(file_name);
        }
    }
    file_names.sort();
    let mut out = Vec::with_capacity(file_names.len());
    for file_name in file_names {
        // Get components of name
        let tokens = output_pattern.captures(&file_name).ok_or("Couldn't parse the file name")?;
        out.push(TestCasePaths {
            trace: samples.join("traces").join(format!("{}.trace", &tokens["trace"])),
            config: samples.join("inputs").join(format!("{}.cfg", &tokens["config"])),
            output: samples.join("outputs").join(&file_name),
        });
    }
    Ok(out)
}
