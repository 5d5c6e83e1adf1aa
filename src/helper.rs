// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use tempfile::TempDir;
use tempfile::tempdir;

use crate::document::LineType;
use crate::document::StrokeDocument;
use crate::error::Fallible;

/// Create a fresh profile directory for tests. The directory is deleted
/// when the returned guard is dropped.
pub fn create_tmp_profile() -> Fallible<TempDir> {
    Ok(tempdir()?)
}

/// Build a document with `strokes` synthetic freehand strokes.
pub fn sample_document(strokes: usize) -> StrokeDocument {
    let mut doc = StrokeDocument::empty();
    for i in 0..strokes {
        let x = i as f64;
        doc.point_arrays
            .push(vec![vec![x, x + 0.5, 0.25], vec![x + 1.0, x + 1.5, 0.75]]);
        doc.line_types.push(LineType::Freehand);
    }
    doc
}
