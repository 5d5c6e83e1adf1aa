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

use crate::document::StrokeDocument;
use crate::store::StrokeStore;
use crate::types::card_id::CardId;
use crate::types::side::Side;
use crate::types::window_size::WindowSize;

// Ink drawn on the question view must never disappear when the answer
// view's document is saved or loaded. Whether the all document already
// contains the front strokes is decided by comparing stroke-array
// *lengths*, not content: the inherited heuristic. It is cheap and makes
// the merge idempotent, but can misfire if the user deletes question
// strokes and draws an equal number of answer strokes.

/// Merge the stored front document into a new all document about to be
/// saved. Returns the input unchanged when there is nothing to merge or
/// either document won't decode.
pub fn merge_on_answer_save(store: &mut StrokeStore, card: &CardId, new_all_text: &str) -> String {
    let front_text = match store.load(card, Side::Front) {
        Some(text) => text,
        None => return new_all_text.to_string(),
    };
    if front_text == new_all_text {
        return new_all_text.to_string();
    }
    let front = match StrokeDocument::decode(&front_text) {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!("card {card}: front document skipped in merge: {e}");
            return new_all_text.to_string();
        }
    };
    let all = match StrokeDocument::decode(new_all_text) {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!("card {card}: all document skipped in merge: {e}");
            return new_all_text.to_string();
        }
    };
    if all.stroke_count() >= front.stroke_count() {
        // Front strokes already at the head of the all document.
        return new_all_text.to_string();
    }
    let merged = prepend_front(&front, &all);
    match merged.encode() {
        Ok(text) => {
            log::debug!(
                "card {card}: merged {} front strokes into all document",
                front.stroke_count()
            );
            text
        }
        Err(e) => {
            log::error!("card {card}: merge failed to encode: {e}");
            new_all_text.to_string()
        }
    }
}

/// On entering the answer view, make sure the stored all document contains
/// at least the front strokes, persisting the merge before the surface
/// loads it. A missing all document is treated as empty, so question ink
/// shows up on the answer view even when no save happened in between.
pub fn merge_on_answer_show(store: &mut StrokeStore, card: &CardId) {
    let front_text = match store.load(card, Side::Front) {
        Some(text) => text,
        None => return,
    };
    let front = match StrokeDocument::decode(&front_text) {
        Ok(doc) => doc,
        Err(e) => {
            log::warn!("card {card}: front document skipped in merge: {e}");
            return;
        }
    };
    let all = match store.load(card, Side::All) {
        Some(text) => match StrokeDocument::decode(&text) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("card {card}: all document skipped in merge: {e}");
                return;
            }
        },
        None => StrokeDocument::empty(),
    };
    if all.stroke_count() >= front.stroke_count() {
        return;
    }
    let merged = prepend_front(&front, &all);
    match merged.encode() {
        Ok(text) => {
            store.save(card, Side::All, &text, None);
            log::debug!(
                "card {card}: answer view backfilled with {} front strokes",
                front.stroke_count()
            );
        }
        Err(e) => log::error!("card {card}: merge failed to encode: {e}"),
    }
}

/// Fetch the captured window geometry for one side, adjusted for the host
/// platform. On the Windows family the OS chrome eats into the client
/// area, so the height is scaled up: 15% on high-density displays, 10%
/// otherwise. Width is never adjusted.
pub fn resolve_window_size(
    store: &mut StrokeStore,
    card: &CardId,
    side: Side,
    windows_host: bool,
    device_pixel_ratio: f64,
) -> Option<WindowSize> {
    let size = store.window_size(card, side)?;
    if !windows_host {
        return Some(size);
    }
    // Integer arithmetic: the float product 600.0 * 1.15 lands just under
    // 690 and would truncate to 689.
    let height = if device_pixel_ratio > 1.0 {
        size.height * 115 / 100
    } else {
        size.height * 110 / 100
    };
    Some(WindowSize::new(size.width, height))
}

/// Prepend the front document's arrays to the all document's. The
/// calligraphy records are merged only when both sides carry them.
fn prepend_front(front: &StrokeDocument, all: &StrokeDocument) -> StrokeDocument {
    let mut merged = all.clone();
    merged.point_arrays = front
        .point_arrays
        .iter()
        .chain(all.point_arrays.iter())
        .cloned()
        .collect();
    merged.line_types = front
        .line_types
        .iter()
        .chain(all.line_types.iter())
        .cloned()
        .collect();
    if let (Some(front_cal), Some(all_cal)) = (&front.calligraphy, &all.calligraphy) {
        merged.calligraphy = Some(front_cal.iter().chain(all_cal.iter()).cloned().collect());
    }
    merged
}
