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

use std::fmt::Display;
use std::fmt::Formatter;

use serde::Deserialize;
use serde::Serialize;

use crate::error::Fallible;
use crate::types::window_size::WindowSize;

/// One point sample: coordinates plus pressure, as emitted by the drawing
/// surface. Kept as a plain number list so coordinates round-trip without
/// the core knowing the surface's sample layout.
pub type Sample = Vec<f64>;

/// One continuous ink path: an ordered sequence of samples.
pub type Stroke = Vec<Sample>;

/// The serialized ink for one view of one card.
///
/// This is the interchange format exchanged with the drawing surface. The
/// two stroke arrays are index-aligned: `line_types[i]` is the style of
/// `point_arrays[i]`. The optional calligraphy records, when present, are
/// aligned the same way.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct StrokeDocument {
    #[serde(rename = "arrays_of_points")]
    pub point_arrays: Vec<Stroke>,
    #[serde(rename = "line_type_history")]
    pub line_types: Vec<LineType>,
    /// Alternate-format stroke records from the calligraphy brush. Opaque
    /// to the core; carried through saves and merges untouched.
    #[serde(rename = "strokes", skip_serializing_if = "Option::is_none")]
    pub calligraphy: Option<Vec<serde_json::Value>>,
    /// Host window dimensions captured at save time.
    #[serde(rename = "window_size", skip_serializing_if = "Option::is_none")]
    pub window_size: Option<WindowSize>,
}

/// The per-stroke style tag.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineType {
    Solid,
    Dashed,
    Wavy,
    Freehand,
    Shape,
}

/// The document text could not be decoded: invalid JSON, a missing
/// required field, or index-misaligned stroke arrays. Callers treat this
/// as "no document", never as a reason to interrupt review.
#[derive(Debug)]
pub struct MalformedDocument {
    reason: String,
}

impl MalformedDocument {
    fn new(reason: String) -> Self {
        Self { reason }
    }
}

impl Display for MalformedDocument {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "malformed stroke document: {}", self.reason)
    }
}

impl std::error::Error for MalformedDocument {}

impl StrokeDocument {
    /// A document with no strokes.
    pub fn empty() -> Self {
        Self {
            point_arrays: Vec::new(),
            line_types: Vec::new(),
            calligraphy: None,
            window_size: None,
        }
    }

    /// Serialize to the textual interchange format. Field order follows the
    /// struct and is stable; coordinates are written losslessly.
    pub fn encode(&self) -> Fallible<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Parse the textual interchange format, enforcing the alignment
    /// invariants. A violation yields an error, never a partially
    /// populated document.
    pub fn decode(text: &str) -> Result<Self, MalformedDocument> {
        let doc: StrokeDocument =
            serde_json::from_str(text).map_err(|e| MalformedDocument::new(e.to_string()))?;
        if doc.line_types.len() != doc.point_arrays.len() {
            return Err(MalformedDocument::new(format!(
                "{} strokes but {} line types",
                doc.point_arrays.len(),
                doc.line_types.len()
            )));
        }
        if let Some(calligraphy) = &doc.calligraphy {
            if calligraphy.len() != doc.point_arrays.len() {
                return Err(MalformedDocument::new(format!(
                    "{} strokes but {} calligraphy records",
                    doc.point_arrays.len(),
                    calligraphy.len()
                )));
            }
        }
        Ok(doc)
    }

    /// Return a copy with `window_size` set, overwriting any previous
    /// capture.
    pub fn attach_window_size(&self, size: WindowSize) -> Self {
        let mut doc = self.clone();
        doc.window_size = Some(size);
        doc
    }

    /// The number of strokes in the document.
    pub fn stroke_count(&self) -> usize {
        self.point_arrays.len()
    }
}
