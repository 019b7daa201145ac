//! Two-stage container image recipe.
//!
//! Models the build recipe for the published image: a builder stage installs
//! the Python dependency manifest into an isolated prefix, then the final
//! minimal image receives that prefix, the application tree and the version
//! file. The runtime contract is fixed: working directory `/app`, stop signal
//! SIGINT, entry command `python -u /app/amcrest2mqtt.py`, identical for
//! every target architecture.

use crate::error::{RecipeError, Result};
use std::path::Path;

/// Entry command of the published image, in exec form
pub const ENTRY_COMMAND: [&str; 3] = ["python", "-u", "/app/amcrest2mqtt.py"];

/// Working directory of the published image
pub const WORKDIR: &str = "/app";

/// Stop signal honored by the published image
pub const STOP_SIGNAL: &str = "SIGINT";

/// Prefix directory dependencies are installed into in the builder stage
pub const INSTALL_PREFIX: &str = "/install";

/// The two-stage image build recipe
#[derive(Debug, Clone)]
pub struct ImageRecipe {
    /// Base image for both stages
    pub base_image: String,
    /// Application source directory, relative to the build context
    pub app_dir: String,
    /// Dependency manifest file, relative to the build context
    pub manifest: String,
    /// Version file, relative to the build context
    pub version_file: String,
}

impl Default for ImageRecipe {
    fn default() -> Self {
        Self {
            base_image: "python:3.12-alpine".to_string(),
            app_dir: "src".to_string(),
            manifest: "requirements.txt".to_string(),
            version_file: "VERSION".to_string(),
        }
    }
}

impl ImageRecipe {
    /// Render the recipe as Dockerfile text.
    pub fn render(&self) -> String {
        let cmd = serde_json::to_string(&ENTRY_COMMAND).unwrap_or_default();

        format!(
            "FROM {base} AS builder\n\
             \n\
             COPY {manifest} .\n\
             RUN pip install --no-cache-dir --prefix={prefix} -r {manifest}\n\
             \n\
             FROM {base}\n\
             \n\
             COPY --from=builder {prefix} /usr/local\n\
             COPY {app_dir} {workdir}\n\
             COPY {version_file} {workdir}/{version_file}\n\
             \n\
             WORKDIR {workdir}\n\
             STOPSIGNAL {stop_signal}\n\
             CMD {cmd}\n",
            base = self.base_image,
            manifest = self.manifest,
            prefix = INSTALL_PREFIX,
            app_dir = self.app_dir,
            version_file = self.version_file,
            workdir = WORKDIR,
            stop_signal = STOP_SIGNAL,
            cmd = cmd,
        )
    }

    /// Verify a Dockerfile on disk honors the image contract.
    pub fn verify(&self, dockerfile: &Path) -> Result<()> {
        if !dockerfile.exists() {
            return Err(RecipeError::NotFound {
                path: dockerfile.to_path_buf(),
            }
            .into());
        }

        let text = std::fs::read_to_string(dockerfile)?;
        self.verify_text(&text)
    }

    /// Verify Dockerfile text honors the image contract.
    pub fn verify_text(&self, text: &str) -> Result<()> {
        let lines: Vec<&str> = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .collect();

        let stages = lines
            .iter()
            .filter(|l| starts_with_keyword(l, "FROM"))
            .count();
        if stages != 2 {
            return Err(contract(format!(
                "expected a two-stage build (2 FROM instructions), found {stages}"
            )));
        }

        if !lines
            .iter()
            .any(|l| starts_with_keyword(l, "COPY") && l.contains("--from="))
        {
            return Err(contract(
                "final stage must copy the install prefix from the builder stage".to_string(),
            ));
        }

        let workdir = lines
            .iter()
            .find(|l| starts_with_keyword(l, "WORKDIR"))
            .ok_or_else(|| contract("missing WORKDIR instruction".to_string()))?;
        if workdir.split_whitespace().nth(1) != Some(WORKDIR) {
            return Err(contract(format!("working directory must be {WORKDIR}")));
        }

        let stop = lines
            .iter()
            .find(|l| starts_with_keyword(l, "STOPSIGNAL"))
            .ok_or_else(|| contract("missing STOPSIGNAL instruction".to_string()))?;
        if stop.split_whitespace().nth(1) != Some(STOP_SIGNAL) {
            return Err(contract(format!("stop signal must be {STOP_SIGNAL}")));
        }

        let cmd_line = lines
            .iter()
            .find(|l| starts_with_keyword(l, "CMD"))
            .ok_or_else(|| contract("missing CMD instruction".to_string()))?;
        let cmd = parse_exec_form(cmd_line)
            .ok_or_else(|| contract("CMD must use exec form, e.g. CMD [\"python\", ...]".to_string()))?;
        if cmd != ENTRY_COMMAND {
            return Err(contract(format!(
                "entry command must be {:?}, found {:?}",
                ENTRY_COMMAND, cmd
            )));
        }

        Ok(())
    }
}

fn contract(reason: String) -> crate::error::ReleaseError {
    RecipeError::ContractViolation { reason }.into()
}

fn starts_with_keyword(line: &str, keyword: &str) -> bool {
    line.len() >= keyword.len()
        && line[..keyword.len()].eq_ignore_ascii_case(keyword)
        && line[keyword.len()..].starts_with([' ', '\t'])
}

/// Parse an exec-form instruction argument, e.g. `CMD ["python", "-u", "x.py"]`.
fn parse_exec_form(line: &str) -> Option<Vec<String>> {
    let start = line.find('[')?;
    serde_json::from_str::<Vec<String>>(&line[start..]).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rendered_recipe_passes_verification() {
        let recipe = ImageRecipe::default();
        recipe.verify_text(&recipe.render()).unwrap();
    }

    #[test]
    fn rendered_recipe_pins_entry_command() {
        let text = ImageRecipe::default().render();
        assert!(text.contains(r#"CMD ["python","-u","/app/amcrest2mqtt.py"]"#));
        assert!(text.contains("STOPSIGNAL SIGINT"));
        assert!(text.contains("WORKDIR /app"));
    }

    #[test]
    fn rendered_recipe_isolates_install_prefix() {
        let text = ImageRecipe::default().render();
        assert!(text.contains("--prefix=/install"));
        assert!(text.contains("COPY --from=builder /install /usr/local"));
    }

    #[test]
    fn single_stage_recipe_is_rejected() {
        let recipe = ImageRecipe::default();
        let text = "FROM python:3.12-alpine\nWORKDIR /app\nSTOPSIGNAL SIGINT\nCMD [\"python\", \"-u\", \"/app/amcrest2mqtt.py\"]\n";
        let err = recipe.verify_text(text).unwrap_err();
        assert!(err.to_string().contains("two-stage"));
    }

    #[test]
    fn wrong_entry_command_is_rejected() {
        let recipe = ImageRecipe::default();
        let text = recipe
            .render()
            .replace("/app/amcrest2mqtt.py", "/app/other.py");
        let err = recipe.verify_text(&text).unwrap_err();
        assert!(err.to_string().contains("entry command"));
    }

    #[test]
    fn shell_form_cmd_is_rejected() {
        let recipe = ImageRecipe::default();
        let text = recipe
            .render()
            .replace(r#"CMD ["python","-u","/app/amcrest2mqtt.py"]"#, "CMD python -u /app/amcrest2mqtt.py");
        let err = recipe.verify_text(&text).unwrap_err();
        assert!(err.to_string().contains("exec form"));
    }

    #[test]
    fn missing_stop_signal_is_rejected() {
        let recipe = ImageRecipe::default();
        let text = recipe.render().replace("STOPSIGNAL SIGINT\n", "");
        let err = recipe.verify_text(&text).unwrap_err();
        assert!(err.to_string().contains("STOPSIGNAL"));
    }

    #[test]
    fn comments_and_case_are_tolerated() {
        let recipe = ImageRecipe::default();
        let text = format!("# release image\n{}", recipe.render().replace("FROM", "from"));
        recipe.verify_text(&text).unwrap();
    }
}
