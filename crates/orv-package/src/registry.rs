//! # Schema Registry
//!
//! [`DataPackage`] loads a package descriptor once and serves read-only
//! lookups over its resources for the lifetime of the handle.
//!
//! Loading goes through four steps:
//!
//! 1. fetch the descriptor text from a local path or an `http(s)` URL;
//! 2. parse it as YAML (`.yaml`/`.yml`) or JSON and check it against the
//!    Data Package profile;
//! 3. fetch schema references, resolved relative to the descriptor;
//! 4. check every schema's shape and resolve resource paths.
//!
//! Any failure is a [`ValidatorError::Load`] naming the descriptor location.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

use orv_core::{
    ResourceDefinition, ResourceSummary, SchemaDescriptor, SourceLocator, ValidatorError,
};
use orv_table::source::is_remote;
use orv_table::{CastMode, Relations, Table, TableOptions, TableSource};
use serde_json::Value;
use url::Url;

use crate::descriptor::{PackageDescriptor, ResourceDescriptor, SchemaRef};
use crate::profile;

const OPEN_REFERRAL_PACKAGE: &str = include_str!("../assets/open-referral/datapackage.json");
const OPEN_REFERRAL_LOCATION: &str = "bundled Open Referral package";

/// One declared resource with everything needed to scan it.
#[derive(Debug, Clone, PartialEq)]
pub struct PackageResource {
    definition: ResourceDefinition,
    schema: Option<SchemaDescriptor>,
    data: Option<Vec<Vec<String>>>,
    header: bool,
}

impl PackageResource {
    pub fn name(&self) -> &str {
        &self.definition.name
    }

    /// The definition without schema.
    pub fn definition(&self) -> &ResourceDefinition {
        &self.definition
    }

    pub fn schema(&self) -> Option<&SchemaDescriptor> {
        self.schema.as_ref()
    }

    pub fn has_inline_data(&self) -> bool {
        self.data.is_some()
    }

    /// Where to read the resource's rows from, if it declares any data.
    pub fn table_source(&self) -> Option<TableSource> {
        if let Some(rows) = &self.data {
            return Some(TableSource::Inline(rows.clone()));
        }
        let source = self.definition.source.as_ref()?;
        Some(TableSource::from_parts(
            source.parts().into_iter().map(str::to_string).collect(),
        ))
    }

    /// Physical header row of the resource's data.
    pub fn headers_row(&self) -> Option<u64> {
        self.header.then_some(1)
    }
}

/// A loaded data package.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPackage {
    location: Option<String>,
    name: Option<String>,
    title: Option<String>,
    resources: Vec<PackageResource>,
}

impl DataPackage {
    /// Load the descriptor at `location`, a local path or an `http(s)` URL.
    pub async fn load(location: &str, http: &reqwest::Client) -> Result<Self, ValidatorError> {
        let base = Base::of(location)?;
        let text = read_text(location, http).await?;
        let raw = parse_document(location, &text)?;
        let mut descriptor = checked(location, raw)?;

        for resource in &mut descriptor.resources {
            if let Some(SchemaRef::Reference(reference)) = &resource.schema {
                check_relative(reference)
                    .map_err(|reason| ValidatorError::load(location, format!("resource '{}': {reason}", resource.name)))?;
                let target = base.resolve(reference);
                tracing::debug!(resource = %resource.name, schema = %target, "fetching table schema");
                let text = read_text(&target, http).await?;
                let schema: SchemaDescriptor = serde_json::from_value(parse_document(&target, &text)?)
                    .map_err(|e| ValidatorError::load(&target, e.to_string()))?;
                resource.schema = Some(SchemaRef::Inline(schema));
            }
        }

        let package = Self::from_descriptor(descriptor, Some(location), &base)?;
        tracing::info!(
            location,
            resources = package.resources.len(),
            "data package loaded"
        );
        Ok(package)
    }

    /// The bundled Open Referral (HSDS) package.
    pub fn open_referral() -> Result<Self, ValidatorError> {
        let raw: Value = serde_json::from_str(OPEN_REFERRAL_PACKAGE)
            .map_err(|e| ValidatorError::load(OPEN_REFERRAL_LOCATION, e.to_string()))?;
        let descriptor = checked(OPEN_REFERRAL_LOCATION, raw)?;
        Self::from_descriptor(descriptor, None, &Base::None)
    }

    /// Build a package from an in-memory descriptor with inline schemas.
    /// Relative resource paths stay relative to the working directory.
    pub fn from_value(descriptor: Value) -> Result<Self, ValidatorError> {
        let location = "inline descriptor";
        let descriptor = checked(location, descriptor)?;
        Self::from_descriptor(descriptor, None, &Base::None)
    }

    fn from_descriptor(
        descriptor: PackageDescriptor,
        location: Option<&str>,
        base: &Base,
    ) -> Result<Self, ValidatorError> {
        let display = location.unwrap_or(OPEN_REFERRAL_LOCATION);
        let mut seen = HashSet::new();
        let mut resources = Vec::with_capacity(descriptor.resources.len());

        for resource in descriptor.resources {
            if !seen.insert(resource.name.to_lowercase()) {
                return Err(ValidatorError::load(
                    display,
                    format!("resource '{}' is declared more than once", resource.name),
                ));
            }
            resources.push(build_resource(resource, base).map_err(|reason| ValidatorError::load(display, reason))?);
        }

        Ok(Self {
            location: location.map(str::to_string),
            name: descriptor.name,
            title: descriptor.title,
            resources,
        })
    }

    /// Where the descriptor was loaded from; `None` for the bundled package.
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    /// Resource names in declaration order.
    pub fn resource_names(&self) -> Vec<String> {
        self.resources.iter().map(|r| r.name().to_string()).collect()
    }

    /// Resource summaries in declaration order.
    pub fn resources(&self) -> Vec<ResourceSummary> {
        self.resources.iter().map(|r| r.definition.summary()).collect()
    }

    /// All resources in declaration order.
    pub fn package_resources(&self) -> &[PackageResource] {
        &self.resources
    }

    /// Look a resource up by name, ignoring case.
    pub fn resource(&self, name: &str) -> Result<&PackageResource, ValidatorError> {
        let wanted = name.to_lowercase();
        self.resources
            .iter()
            .find(|r| r.name().to_lowercase() == wanted)
            .ok_or_else(|| ValidatorError::NotFound(format!("Resource '{name}' not found")))
    }

    /// Definition of a resource. With `include_schema`, the schema is
    /// attached as its key-tagged view.
    pub fn get_definition(
        &self,
        name: &str,
        include_schema: bool,
    ) -> Result<ResourceDefinition, ValidatorError> {
        let resource = self.resource(name)?;
        let mut definition = resource.definition.clone();
        if include_schema {
            definition.schema = resource.schema.as_ref().map(SchemaDescriptor::with_key_tags);
        }
        Ok(definition)
    }

    /// Read the key columns of every resource referenced by `schema`'s
    /// foreign keys. Unreadable or undeclared references are left out, which
    /// turns the corresponding foreign-key checks off.
    pub async fn read_relations(&self, schema: &SchemaDescriptor, http: &reqwest::Client) -> Relations {
        let mut relations = Relations::new();

        for fk in &schema.foreign_keys {
            let name = &fk.reference.resource;
            if name.is_empty() || relations.contains(name) {
                continue;
            }
            let Ok(resource) = self.resource(name) else {
                tracing::debug!(resource = %name, "referenced resource is not declared");
                continue;
            };
            let (Some(source), Some(referenced)) = (resource.table_source(), resource.schema()) else {
                continue;
            };
            let options = TableOptions {
                headers_row: resource.headers_row(),
                relations: None,
            };
            let table = match Table::load(&source, referenced, options, http).await {
                Ok(table) => table,
                Err(err) => {
                    tracing::warn!(resource = %name, error = %err, "cannot read referenced resource");
                    continue;
                }
            };
            let field_names = referenced.field_names();
            let rows = table
                .iter(CastMode::Tolerant)
                .filter_map(Result::ok)
                .map(|row| row.keyed(&field_names))
                .collect();
            relations.insert(name.clone(), rows);
        }

        relations
    }
}

/// Base against which relative locations in a descriptor are resolved.
#[derive(Debug, Clone)]
enum Base {
    None,
    Dir(PathBuf),
    Url(Url),
}

impl Base {
    fn of(location: &str) -> Result<Self, ValidatorError> {
        if is_remote(location) {
            let url = Url::parse(location).map_err(|e| ValidatorError::load(location, e.to_string()))?;
            return Ok(Self::Url(url));
        }
        Ok(Path::new(location)
            .parent()
            .map_or(Self::None, |dir| Self::Dir(dir.to_path_buf())))
    }

    fn resolve(&self, part: &str) -> String {
        if is_remote(part) {
            return part.to_string();
        }
        match self {
            Self::None => part.to_string(),
            Self::Dir(dir) => dir.join(part).display().to_string(),
            Self::Url(url) => url
                .join(part)
                .map(String::from)
                .unwrap_or_else(|_| part.to_string()),
        }
    }
}

/// Local parts of a descriptor must stay under the descriptor's directory.
fn check_relative(part: &str) -> Result<(), String> {
    if is_remote(part) {
        return Ok(());
    }
    let escapes = part.starts_with(['/', '\\', '~'])
        || part.split(['/', '\\']).any(|segment| segment == "..")
        || Path::new(part)
            .components()
            .any(|c| matches!(c, Component::RootDir | Component::Prefix(_) | Component::ParentDir));
    if escapes {
        return Err(format!(
            "path '{part}' must be relative to the descriptor and must not contain '..'"
        ));
    }
    Ok(())
}

async fn read_text(location: &str, http: &reqwest::Client) -> Result<String, ValidatorError> {
    if !is_remote(location) {
        return tokio::fs::read_to_string(location)
            .await
            .map_err(|e| ValidatorError::load(location, e.to_string()));
    }
    let response = http
        .get(location)
        .send()
        .await
        .map_err(|e| ValidatorError::load(location, e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ValidatorError::load(location, format!("HTTP {status}")));
    }
    response
        .text()
        .await
        .map_err(|e| ValidatorError::load(location, e.to_string()))
}

fn parse_document(location: &str, text: &str) -> Result<Value, ValidatorError> {
    let lower = location.to_ascii_lowercase();
    if lower.ends_with(".yaml") || lower.ends_with(".yml") {
        serde_yaml::from_str(text).map_err(|e| ValidatorError::load(location, e.to_string()))
    } else {
        serde_json::from_str(text).map_err(|e| ValidatorError::load(location, e.to_string()))
    }
}

fn checked(location: &str, raw: Value) -> Result<PackageDescriptor, ValidatorError> {
    let violations = profile::check(&raw).map_err(|reason| ValidatorError::load(location, reason))?;
    if !violations.is_empty() {
        let listed: Vec<String> = violations.iter().map(ToString::to_string).collect();
        return Err(ValidatorError::load(
            location,
            format!(
                "descriptor does not match the data package profile: {}",
                listed.join("; ")
            ),
        ));
    }
    serde_json::from_value(raw).map_err(|e| ValidatorError::load(location, e.to_string()))
}

fn build_resource(resource: ResourceDescriptor, base: &Base) -> Result<PackageResource, String> {
    let tabular = resource.is_tabular();
    let header = resource.has_header();

    let schema = match resource.schema {
        Some(SchemaRef::Inline(schema)) => {
            schema
                .check_shape()
                .map_err(|e| format!("resource '{}': {e}", resource.name))?;
            Some(schema)
        }
        Some(SchemaRef::Reference(reference)) => {
            return Err(format!(
                "resource '{}': schema reference '{reference}' was not resolved",
                resource.name
            ))
        }
        None => None,
    };

    let declared = resource.path.as_ref().map(|p| p.parts()).unwrap_or_default();
    for part in &declared {
        check_relative(part).map_err(|reason| format!("resource '{}': {reason}", resource.name))?;
    }
    let parts: Vec<String> = declared.into_iter().map(|part| base.resolve(part)).collect();

    let source = match parts.len() {
        0 => None,
        1 => Some(SourceLocator::Path(parts[0].clone())),
        _ => Some(SourceLocator::Parts(parts.clone())),
    };

    let data = resource
        .data
        .as_ref()
        .map(|data| inline_rows(data, schema.as_ref(), header))
        .transpose()
        .map_err(|e| format!("resource '{}': {e}", resource.name))?;

    let definition = ResourceDefinition {
        title: resource
            .title
            .clone()
            .unwrap_or_else(|| title_from_name(&resource.name)),
        name: resource.name,
        description: resource.description,
        local: !parts.is_empty() && parts.iter().all(|p| !is_remote(p)),
        remote: parts.iter().any(|p| is_remote(p)),
        multipart: parts.len() > 1,
        tabular,
        source,
        schema: None,
    };

    Ok(PackageResource {
        definition,
        schema,
        data,
        header,
    })
}

/// Inline `data` as raw rows. Arrays of objects are laid out in schema
/// field order behind a header row when the dialect declares one.
fn inline_rows(data: &Value, schema: Option<&SchemaDescriptor>, header: bool) -> Result<Vec<Vec<String>>, String> {
    let Value::Array(items) = data else {
        return Err("inline data must be an array of rows".to_string());
    };

    if items.iter().all(Value::is_array) {
        return Ok(items
            .iter()
            .filter_map(Value::as_array)
            .map(|row| row.iter().map(cell_text).collect())
            .collect());
    }

    if items.iter().all(Value::is_object) {
        let columns: Vec<String> = match schema {
            Some(schema) => schema.fields.iter().map(|f| f.name.clone()).collect(),
            None => items
                .first()
                .and_then(Value::as_object)
                .map(|o| o.keys().cloned().collect())
                .unwrap_or_default(),
        };
        let mut rows = Vec::with_capacity(items.len() + 1);
        if header {
            rows.push(columns.clone());
        }
        for item in items.iter().filter_map(Value::as_object) {
            rows.push(
                columns
                    .iter()
                    .map(|c| item.get(c).map(cell_text).unwrap_or_default())
                    .collect(),
            );
        }
        return Ok(rows);
    }

    Err("inline data rows must all be arrays or all be objects".to_string())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// `service_at_location` becomes `Service at location`.
fn title_from_name(name: &str) -> String {
    let spaced = name.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
