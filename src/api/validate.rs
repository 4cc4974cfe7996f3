//! Request validation helpers

use std::path::{Component, Path};

use crate::error::{Error, Result};

const MAX_SERVER_ID_LEN: usize = 128;

/// Fail with every missing field named, in declaration order
pub fn require_fields(fields: &[(&str, bool)]) -> Result<()> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// Whether an optional string carries a non-blank value
pub fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|v| !v.trim().is_empty())
}

/// Check a workspace path sits under the allowed prefix
pub fn workspace<'a>(prefix: &str, workspace: Option<&'a str>) -> Result<&'a str> {
    let workspace = workspace
        .map(str::trim)
        .filter(|w| !w.is_empty())
        .ok_or_else(|| Error::Validation("Workspace path is required".into()))?;

    let outside = || Error::Validation(format!("Workspace must be within {}", prefix));

    if !workspace.starts_with(prefix) {
        return Err(outside());
    }
    if Path::new(workspace)
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(outside());
    }

    Ok(workspace)
}

/// Check an MCP server id
pub fn server_id(id: Option<&str>) -> Result<&str> {
    let id = id
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| Error::Validation("server_id is required".into()))?;

    if id.len() > MAX_SERVER_ID_LEN {
        return Err(Error::Validation(format!(
            "server_id must be at most {} characters",
            MAX_SERVER_ID_LEN
        )));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-' | '@' | '/'))
    {
        return Err(Error::Validation(format!("Invalid server_id: {}", id)));
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PREFIX: &str = "/home/scrapybara/";

    #[test]
    fn test_require_fields_names_only_missing() {
        assert!(require_fields(&[("id", true), ("content", true)]).is_ok());

        let err = require_fields(&[("id", true), ("content", false)]).unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: content");

        let err = require_fields(&[("id", false), ("content", false)]).unwrap_err();
        assert_eq!(err.to_string(), "Missing required fields: id, content");
    }

    #[test]
    fn test_present() {
        assert!(present(&Some("x".into())));
        assert!(!present(&Some("  ".into())));
        assert!(!present(&None));
    }

    #[test]
    fn test_workspace_accepts_prefix() {
        assert_eq!(
            workspace(PREFIX, Some("/home/scrapybara/proj")).unwrap(),
            "/home/scrapybara/proj"
        );
    }

    #[test]
    fn test_workspace_rejects_missing_and_outside() {
        assert!(matches!(workspace(PREFIX, None), Err(Error::Validation(_))));
        assert!(matches!(workspace(PREFIX, Some("")), Err(Error::Validation(_))));
        assert!(workspace(PREFIX, Some("/etc/passwd")).is_err());
        assert!(workspace(PREFIX, Some("/home/scrapybara-evil/x")).is_err());
        assert!(workspace(PREFIX, Some("/home/scrapybara/../root")).is_err());
    }

    #[test]
    fn test_server_id_rules() {
        assert_eq!(server_id(Some(" github ")).unwrap(), "github");
        assert!(server_id(Some("@scope/server-1.2_x")).is_ok());
        assert!(server_id(None).is_err());
        assert!(server_id(Some("has space")).is_err());
        assert!(server_id(Some(&"a".repeat(129))).is_err());
    }
}
