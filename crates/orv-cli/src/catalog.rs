//! # Resource Catalogue Subcommands
//!
//! `orv resources` prints one line per resource; `orv describe` prints the
//! key-tagged definition as pretty JSON.

use std::io::Write;

use anyhow::Result;
use clap::Args;

use crate::Context;

/// Arguments for `orv describe`.
#[derive(Args, Debug)]
pub struct DescribeArgs {
    /// Resource name (case-insensitive).
    #[arg(value_name = "NAME")]
    pub name: String,
}

/// List resources as `name<TAB>title`.
pub fn run_resources(ctx: &Context, out: &mut impl Write) -> Result<u8> {
    let package = ctx.package()?;
    for summary in package.resources() {
        writeln!(out, "{}\t{}", summary.name, summary.title)?;
    }
    Ok(0)
}

/// Print the definition of one resource.
pub fn run_describe(args: &DescribeArgs, ctx: &Context, out: &mut impl Write) -> Result<u8> {
    let definition = ctx.package()?.get_definition(&args.name, true)?;
    writeln!(out, "{}", serde_json::to_string_pretty(&definition)?)?;
    Ok(0)
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

    #[tokio::test]
    async fn resources_lists_names_and_titles() {
        let mut out = Vec::new();
        let code = run_resources(&context().await, &mut out).unwrap();
        assert_eq!(code, 0);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 22);
        assert!(text.lines().any(|l| l == "service_at_location\tService at location"));
    }

    #[tokio::test]
    async fn describe_prints_key_tagged_definition() {
        let mut out = Vec::new();
        let args = DescribeArgs {
            name: "Program".into(),
        };
        run_describe(&args, &context().await, &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["name"], "program");
        assert_eq!(value["schema"]["fields"][0]["keys"]["primary"], true);
    }

    #[tokio::test]
    async fn describe_unknown_resource_fails() {
        let args = DescribeArgs {
            name: "unicorn".into(),
        };
        let err = run_describe(&args, &context().await, &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("Resource 'unicorn' not found"));
    }
}
