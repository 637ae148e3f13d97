use std::path::Path;

use api_smoke::{submit_sms_templates, SmsGatewayConfig, SmsTemplate};

use super::CliResult;
use crate::cli::SmsCommand;
use crate::error::CliError;

pub(crate) fn load_templates(path: &Path) -> Result<Vec<SmsTemplate>, CliError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| CliError::Usage(format!("cannot read {}: {e}", path.display())))?;
    serde_json::from_str(&raw)
        .map_err(|e| CliError::Usage(format!("{} is not a template list: {e}", path.display())))
}

pub async fn run(cmd: SmsCommand) -> CliResult {
    match cmd {
        SmsCommand::SubmitTemplates { file } => {
            let templates = load_templates(&file)?;
            let config = SmsGatewayConfig::from_env()?;
            let summary = submit_sms_templates(&config, &templates).await?;

            for name in &summary.accepted {
                println!("✅ {name}");
            }
            for (name, reason) in &summary.rejected {
                println!("❌ {name}: {reason}");
            }
            if !summary.all_accepted() {
                return Err(CliError::Failed(format!(
                    "{} of {} template(s) rejected",
                    summary.rejected.len(),
                    templates.len()
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::load_templates;

    #[test]
    fn loads_a_template_list() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "reminder", "body": "See you at {{time}}"}}]"#).unwrap();
        let templates = load_templates(file.path()).unwrap();
        assert_eq!(templates.len(), 1);
        assert_eq!(templates[0].name, "reminder");
        assert_eq!(templates[0].body, "See you at {time}");
    }

    #[test]
    fn malformed_file_is_a_usage_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        assert_eq!(load_templates(file.path()).unwrap_err().exit_code(), 2);
    }
}
