use std::{collections::HashMap, env::current_dir, path::Path, path::PathBuf};

use miette::{miette, Context, IntoDiagnostic, Result};


/// Placeholder that expands to the directory containing the loaded configuration file.
pub const CONFIGURATION_DIRECTORY_PLACEHOLDER: &str = "{CONFIGURATION_DIRECTORY}";


/// Returns the default configuration filepath, which is at
/// `{current directory}/data/configuration.toml`.
pub fn get_default_configuration_file_path() -> Result<PathBuf> {
    let mut configuration_filepath = current_dir()
        .into_diagnostic()
        .wrap_err_with(|| miette!("Could not get the current directory."))?;
    configuration_filepath.push("data/configuration.toml");

    if !configuration_filepath.exists() {
        return Err(miette!(
            "Could not find configuration.toml in data directory ({}).",
            configuration_filepath.display()
        ));
    }

    Ok(configuration_filepath)
}


/// Builds the placeholder map for a configuration file located at `configuration_file_path`.
pub fn placeholders_for_configuration_file(
    configuration_file_path: &Path,
) -> HashMap<&'static str, String> {
    let configuration_directory = configuration_file_path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();

    let mut placeholders_map = HashMap::with_capacity(1);
    placeholders_map.insert(
        CONFIGURATION_DIRECTORY_PLACEHOLDER,
        configuration_directory.to_string_lossy().to_string(),
    );

    placeholders_map
}


#[must_use = "function returns the modified path"]
pub fn replace_placeholders_in_path<S>(
    original_path: S,
    placeholders: &HashMap<&'static str, String>,
) -> PathBuf
where
    S: Into<String>,
{
    let mut path_string: String = original_path.into();

    for (key, value) in placeholders.iter() {
        path_string = path_string.replace(key, value);
    }

    PathBuf::from(path_string)
}
