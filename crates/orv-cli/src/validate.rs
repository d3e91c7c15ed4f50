//! # Validation Subcommands
//!
//! `orv validate` checks one CSV file against a resource type;
//! `orv package` checks every resource of a data package. Both print the
//! JSON result and return exit code 1 when anything is invalid.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use orv_package::DataPackage;
use orv_table::TableSource;
use orv_validator::{PackageOptions, ResourceOptions};

use crate::Context;

/// Arguments for `orv validate`.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Resource type the file should conform to.
    #[arg(long = "type", short = 't', value_name = "NAME")]
    pub resource_type: String,

    /// 1-based row holding the column headers.
    #[arg(long, default_value_t = 1, conflicts_with = "no_headers")]
    pub headers_row: u64,

    /// The file has no header row; columns are matched by position.
    #[arg(long)]
    pub no_headers: bool,

    /// CSV file, or an `http(s)` URL.
    #[arg(value_name = "FILE")]
    pub file: String,
}

impl ValidateArgs {
    fn headers_row(&self) -> Option<u64> {
        if self.no_headers || self.headers_row == 0 {
            None
        } else {
            Some(self.headers_row)
        }
    }
}

/// Arguments for `orv package`.
#[derive(Args, Debug)]
pub struct PackageArgs {
    /// Location of the `datapackage.json` (or `.yaml`) to validate.
    #[arg(value_name = "LOCATION")]
    pub location: String,

    /// Check foreign keys against the referenced resources.
    #[arg(long)]
    pub relations: bool,
}

/// Validate one file against a resource type.
pub async fn run_validate(args: &ValidateArgs, ctx: &Context, out: &mut impl Write) -> Result<u8> {
    let source = TableSource::from_location(&args.file);
    if let TableSource::Path(path) = &source {
        anyhow::ensure!(path.is_file(), "file not found: {}", path.display());
    }

    let result = ctx
        .validator
        .validate_resource(
            Some(source),
            Some(&args.resource_type),
            ResourceOptions {
                headers_row: args.headers_row(),
            },
        )
        .await?;

    writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
    Ok(if result.valid { 0 } else { 1 })
}

/// Validate every resource of the package at `args.location`.
pub async fn run_package(args: &PackageArgs, ctx: &Context, out: &mut impl Write) -> Result<u8> {
    let location = resolve_location(&args.location);
    let package = DataPackage::load(&location, &ctx.http).await?;
    let results = ctx
        .validator
        .with_package(Arc::new(package))
        .validate_package(PackageOptions {
            relations: args.relations,
        })
        .await?;

    writeln!(out, "{}", serde_json::to_string_pretty(&results)?)?;
    let invalid = results.iter().filter(|r| !r.valid).count();
    if invalid > 0 {
        tracing::info!(invalid, total = results.len(), "package has invalid resources");
        return Ok(1);
    }
    Ok(0)
}

/// A directory stands for the `datapackage.json` inside it.
fn resolve_location(location: &str) -> String {
    if orv_table::source::is_remote(location) {
        return location.to_string();
    }
    let path = PathBuf::from(location);
    if path.is_dir() {
        return path.join("datapackage.json").display().to_string();
    }
    location.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use std::time::Duration;

    async fn context() -> Context {
        Context::load(&Settings {
            datapackage: None,
            timeout: Duration::from_secs(5),
        })
        .await
        .unwrap()
    }

    fn write(dir: &std::path::Path, name: &str, contents: &str) -> String {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path.display().to_string()
    }

    fn validate_args(resource_type: &str, file: String) -> ValidateArgs {
        ValidateArgs {
            resource_type: resource_type.into(),
            headers_row: 1,
            no_headers: false,
            file,
        }
    }

    #[tokio::test]
    async fn valid_file_exits_zero() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(
            dir.path(),
            "programs.csv",
            "id,organization_id,name,alternate_name\n1,org-1,Meals,\n",
        );
        let mut out = Vec::new();
        let code = run_validate(&validate_args("program", file), &context().await, &mut out)
            .await
            .unwrap();
        assert_eq!(code, 0);
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["valid"], true);
    }

    #[tokio::test]
    async fn invalid_file_exits_one() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "programs.csv", "a,b\n1,2\n");
        let mut out = Vec::new();
        let code = run_validate(&validate_args("program", file), &context().await, &mut out)
            .await
            .unwrap();
        assert_eq!(code, 1);
    }

    #[tokio::test]
    async fn no_headers_matches_by_position() {
        let dir = tempfile::tempdir().unwrap();
        let file = write(dir.path(), "programs.csv", "1,org-1,Meals,\n");
        let mut args = validate_args("program", file);
        args.no_headers = true;
        let code = run_validate(&args, &context().await, &mut Vec::new())
            .await
            .unwrap();
        assert_eq!(code, 0);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let args = validate_args("program", "/no/such/programs.csv".into());
        let err = run_validate(&args, &context().await, &mut Vec::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("file not found"));
    }

    #[tokio::test]
    async fn package_directory_resolves_to_descriptor() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "datapackage.json",
            r#"{"resources": [{"name": "phone", "path": "phones.csv",
                "schema": {"fields": [{"name": "id"}, {"name": "number"}]}}]}"#,
        );
        write(dir.path(), "phones.csv", "id,number\n1,555-0100\n");

        let args = PackageArgs {
            location: dir.path().display().to_string(),
            relations: false,
        };
        let mut out = Vec::new();
        let code = run_package(&args, &context().await, &mut out).await.unwrap();
        assert_eq!(code, 0);
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value[0]["resource"], "phone");
        assert_eq!(value[0]["valid"], true);
    }
}
