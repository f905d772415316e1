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


//! # Renderer Port
//!
//! Turns a `DdlContext` into DDL text. The template itself lives outside
//! the code; only the contract is fixed here.

use crate::domain::entities::DdlContext;
use crate::domain::errors::Result;

pub trait DdlRendererPort: Send + Sync {
    /// Renders the DDL for one table. Failures surface as `ExportError::RenderError`.
    fn render(&self, context: &DdlContext) -> Result<String>;
}
