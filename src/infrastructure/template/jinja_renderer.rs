// Copyright 2026 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! # Jinja Template Adapter
//!
//! Renders the Athena DDL from a Jinja template on disk
//! (`template/athena_table_template.sql.j2` by default).
//!
//! Undefined variables are errors rather than empty strings, so a template
//! that asks for a field the context does not carry fails loudly.

use crate::domain::entities::DdlContext;
use crate::domain::errors::{ExportError, Result};
use crate::ports::renderer_port::DdlRendererPort;
use log::debug;
use minijinja::{Environment, UndefinedBehavior};
use std::path::Path;

/// `JinjaRenderer` implements the `DdlRendererPort` with minijinja.
pub struct JinjaRenderer {
    env: Environment<'static>,
    template_name: String,
}

impl JinjaRenderer {
    /// Loads `template_name` from `template_dir`.
    ///
    /// The template is compiled once here so syntax errors show up at startup.
    pub fn from_dir(template_dir: impl AsRef<Path>, template_name: &str) -> Result<Self> {
        let dir = template_dir.as_ref();
        if !dir.join(template_name).is_file() {
            return Err(ExportError::ConfigError(format!(
                "Template {} not found in {}",
                template_name,
                dir.display()
            )));
        }

        let mut env = Self::environment();
        env.set_loader(minijinja::path_loader(dir.to_path_buf()));
        env.get_template(template_name)?;
        debug!("Loaded template {} from {}", template_name, dir.display());

        Ok(Self {
            env,
            template_name: template_name.to_string(),
        })
    }

    /// Builds a renderer from an in-memory template.
    pub fn from_source(template_name: &str, source: &str) -> Result<Self> {
        let mut env = Self::environment();
        env.add_template_owned(template_name.to_string(), source.to_string())?;
        Ok(Self {
            env,
            template_name: template_name.to_string(),
        })
    }

    fn environment() -> Environment<'static> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env
    }
}

impl DdlRendererPort for JinjaRenderer {
    fn render(&self, context: &DdlContext) -> Result<String> {
        let template = self.env.get_template(&self.template_name)?;
        Ok(template.render(context)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::ColumnDescriptor;

    fn context() -> DdlContext {
        DdlContext {
            data_path: "s3://bucket/".into(),
            schema_name: "main".into(),
            table_name: "t".into(),
            table_comment: "it's a table".into(),
            columns: vec![
                ColumnDescriptor {
                    name: "id".into(),
                    catalog_type: "int64".into(),
                    target_type: Some("BIGINT".into()),
                },
                ColumnDescriptor {
                    name: "at".into(),
                    catalog_type: "time".into(),
                    target_type: None,
                },
            ],
        }
    }

    #[test]
    fn test_render_bundled_template() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/template");
        let renderer = JinjaRenderer::from_dir(dir, "athena_table_template.sql.j2").unwrap();
        let ddl = renderer.render(&context()).unwrap();

        let expected = "CREATE EXTERNAL TABLE IF NOT EXISTS `main`.`t` (\n  \
                        `id` BIGINT,\n  \
                        `at` STRING COMMENT 'unsupported catalog type: time'\n\
                        )\n\
                        COMMENT 'it''s a table'\n\
                        STORED AS PARQUET\n\
                        LOCATION 's3://bucket/main/t/';";
        assert_eq!(ddl.trim_end(), expected);
    }

    #[test]
    fn test_render_from_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("simple.sql.j2"),
            "{{ schema_name }}.{{ table_name }}:{% for c in columns %}{{ c.name }};{% endfor %}",
        )
        .unwrap();

        let renderer = JinjaRenderer::from_dir(dir.path(), "simple.sql.j2").unwrap();
        assert_eq!(renderer.render(&context()).unwrap(), "main.t:id;at;");
    }

    #[test]
    fn test_missing_template_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = JinjaRenderer::from_dir(dir.path(), "athena_table_template.sql.j2");
        assert!(matches!(result, Err(ExportError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_template() {
        let result = JinjaRenderer::from_source("bad.sql.j2", "{% for c in columns %}");
        assert!(matches!(result, Err(ExportError::RenderError(_))));
    }

    #[test]
    fn test_undefined_field_is_render_error() {
        let renderer = JinjaRenderer::from_source("t.sql.j2", "{{ partition_by }}").unwrap();
        let result = renderer.render(&context());
        assert!(matches!(result, Err(ExportError::RenderError(_))));
    }
}
