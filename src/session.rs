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

use crate::bridge::BridgeCommand;
use crate::reconcile::merge_on_answer_save;
use crate::reconcile::merge_on_answer_show;
use crate::reconcile::resolve_window_size;
use crate::settings::Settings;
use crate::store::StrokeStore;
use crate::types::card_id::CardId;
use crate::types::side::ActiveSide;
use crate::types::side::Side;
use crate::types::window_size::WindowSize;

/// The drawing canvas overlaid on the review screen. The controller only
/// ever hands it serialized documents and basic commands; input handling,
/// smoothing, and undo are its own business.
pub trait ReviewSurface {
    fn clear(&mut self);
    /// Push a document for display. `front_only` tells the surface whether
    /// it is looking at question-view ink or the full union.
    fn load_strokes(&mut self, document: &str, front_only: bool);
    fn resize(&mut self);
    fn set_card_id(&mut self, card: &CardId);
}

/// The host application's window, for geometry restoration and user
/// notices.
pub trait HostWindow {
    fn resize_to(&mut self, size: WindowSize);
    fn notify(&mut self, message: &str);
}

/// Binds the host's view-transition events to the store and reconciler.
///
/// Owns the active-side state machine: two states, flipped only by
/// `show_question` and `show_answer`, starting at `Question`. Every entry
/// point catches failures internally; persistence trouble is logged, never
/// allowed to interrupt the review.
pub struct SessionController {
    store: StrokeStore,
    settings: Settings,
    active: ActiveSide,
    current_card: Option<CardId>,
    /// Whether the drawing overlay is switched on at all. When off, view
    /// transitions still track state but nothing is pushed to the surface.
    overlay_enabled: bool,
}

impl SessionController {
    pub fn new(store: StrokeStore, settings: Settings) -> Self {
        Self {
            store,
            settings,
            active: ActiveSide::Question,
            current_card: None,
            overlay_enabled: true,
        }
    }

    pub fn active_side(&self) -> ActiveSide {
        self.active
    }

    pub fn current_card(&self) -> Option<&CardId> {
        self.current_card.as_ref()
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    pub fn set_overlay_enabled(&mut self, enabled: bool) {
        self.overlay_enabled = enabled;
    }

    /// The host is showing a card's question view.
    pub fn show_question(&mut self, card: &CardId, surface: &mut dyn ReviewSurface) {
        self.active = ActiveSide::Question;
        self.current_card = Some(card.clone());
        surface.clear();
        if !self.overlay_enabled {
            return;
        }
        if let Some(text) = self.store.load(card, Side::Front) {
            surface.load_strokes(&text, true);
        }
        surface.resize();
    }

    /// The host is revealing the card's answer view. The stored all
    /// document is reconciled with the front before the surface loads it,
    /// so the answer never shows fewer strokes than the question did.
    pub fn show_answer(&mut self, card: &CardId, surface: &mut dyn ReviewSurface) {
        self.active = ActiveSide::Answer;
        self.current_card = Some(card.clone());
        if !self.overlay_enabled {
            return;
        }
        merge_on_answer_show(&mut self.store, card);
        if let Some(text) = self.store.load(card, Side::All) {
            surface.load_strokes(&text, false);
        }
        surface.resize();
    }

    /// The surface reports the canvas contents for persistence. Honors
    /// the user's opt-out before any I/O; routes by the active side.
    pub fn strokes_received(
        &mut self,
        card: &CardId,
        document: &str,
        window_size: Option<WindowSize>,
    ) {
        if !self.settings.save_strokes_enabled {
            log::debug!("stroke saving disabled, dropping update for card {card}");
            return;
        }
        match self.active {
            ActiveSide::Question => {
                self.store.save(card, Side::Front, document, window_size);
            }
            ActiveSide::Answer => {
                let merged = merge_on_answer_save(&mut self.store, card, document);
                self.store.save(card, Side::All, &merged, window_size);
            }
        }
    }

    /// The user asked to restore the window geometry captured with one
    /// side's document. A missing capture is the common case and only
    /// produces a notice.
    pub fn restore_window_size(
        &mut self,
        card: &CardId,
        side: Side,
        windows_host: bool,
        device_pixel_ratio: f64,
        window: &mut dyn HostWindow,
    ) {
        match resolve_window_size(&mut self.store, card, side, windows_host, device_pixel_ratio) {
            Some(size) => {
                window.resize_to(size);
                window.notify(&format!(
                    "Window restored to {}x{}.",
                    size.width, size.height
                ));
            }
            None => {
                window.notify("No saved window size for this card.");
            }
        }
    }

    /// Dispatch a decoded bridge command.
    pub fn handle(
        &mut self,
        command: BridgeCommand,
        surface: &mut dyn ReviewSurface,
        window: &mut dyn HostWindow,
    ) {
        match command {
            BridgeCommand::SaveStrokes {
                card,
                document,
                window_size,
            } => self.strokes_received(&card, &document, window_size),
            BridgeCommand::SaveStrokesNoResize { card, document } => {
                self.strokes_received(&card, &document, None)
            }
            BridgeCommand::LoadFrontStrokes { card } => {
                self.push_strokes(&card, Side::Front, surface)
            }
            BridgeCommand::LoadAllStrokes { card } => self.push_strokes(&card, Side::All, surface),
            BridgeCommand::LoadStrokes { card } => {
                self.push_strokes(&card, self.active.storage_side(), surface)
            }
            BridgeCommand::RestoreFrontWindowSize {
                card,
                device_pixel_ratio,
                windows_host,
            } => {
                self.restore_window_size(&card, Side::Front, windows_host, device_pixel_ratio, window)
            }
            BridgeCommand::RestoreAllWindowSize {
                card,
                device_pixel_ratio,
                windows_host,
            } => {
                self.restore_window_size(&card, Side::All, windows_host, device_pixel_ratio, window)
            }
            BridgeCommand::RestoreWindowSize {
                card,
                device_pixel_ratio,
                windows_host,
            } => self.restore_window_size(
                &card,
                self.active.storage_side(),
                windows_host,
                device_pixel_ratio,
                window,
            ),
            BridgeCommand::GetCurrentCardId => match self.current_card.clone() {
                Some(card) => {
                    surface.set_card_id(&card);
                    self.push_strokes(&card, self.active.storage_side(), surface);
                }
                None => log::debug!("no card under review"),
            },
        }
    }

    fn push_strokes(&mut self, card: &CardId, side: Side, surface: &mut dyn ReviewSurface) {
        match self.store.load(card, side) {
            Some(text) => surface.load_strokes(&text, side == Side::Front),
            None => log::debug!("no {} document for card {card}", side.tag()),
        }
    }
}
