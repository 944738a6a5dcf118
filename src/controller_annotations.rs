//! Annotation CRUD extracted from `controller`.
//!
//! All four kinds follow the same shape. Creation is batched and merges
//! caller options over the kind's defaults, so every tracked entity carries
//! a fully populated options record. Update and removal demand the caller's
//! copy match the tracked one before any remote call goes out. Each
//! successful mutation notifies change listeners exactly once, whether it
//! touched one entity or fifty.

#[cfg(test)]
#[path = "controller_annotations_test.rs"]
mod controller_annotations_test;

use super::{ControllerError, MapController};
use crate::annotations::{
    AnnotationKind, Circle, CircleOptions, Fill, FillOptions, Line, LineOptions, Symbol,
    SymbolOptions,
};
use crate::channel::ChannelError;
use crate::geo::LngLat;

impl MapController {
    // ====== SYMBOLS ======

    /// Create one symbol. Convenience wrapper around [`Self::add_symbols`].
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails or returns no id.
    pub async fn add_symbol(&mut self, options: SymbolOptions) -> Result<Symbol, ControllerError> {
        let mut created = self.add_symbols(vec![options]).await?;
        let Some(symbol) = created.pop() else {
            return Err(ChannelError::Call {
                method: "create_symbols",
                message: "no id returned".to_owned(),
            }
            .into());
        };
        Ok(symbol)
    }

    /// Create a batch of symbols in one channel call. Caller options are
    /// merged over [`SymbolOptions::defaults`]; the returned entities are in
    /// input order and already tracked. An empty batch is a no-op that
    /// touches neither the channel nor the listeners.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails or returns a wrong
    /// number of ids. The registry is untouched on error.
    pub async fn add_symbols(
        &mut self,
        options: Vec<SymbolOptions>,
    ) -> Result<Vec<Symbol>, ControllerError> {
        if options.is_empty() {
            return Ok(Vec::new());
        }
        let defaults = SymbolOptions::defaults();
        let merged: Vec<SymbolOptions> =
            options.iter().map(|opts| defaults.merged(opts)).collect();
        let ids = self.channel.create_symbols(&merged).await?;
        if ids.len() != merged.len() {
            return Err(batch_size_mismatch("create_symbols", merged.len(), ids.len()).into());
        }
        let created: Vec<Symbol> = ids
            .into_iter()
            .zip(merged)
            .map(|(id, options)| Symbol::new(id, options))
            .collect();
        for symbol in &created {
            self.symbols.insert(symbol.id().to_owned(), symbol.clone());
        }
        self.notify_listeners();
        Ok(created)
    }

    /// Overlay `changes` on a tracked symbol. Present fields win, absent
    /// fields keep their value. Returns the updated entity, which replaces
    /// the caller's now-stale copy.
    ///
    /// # Errors
    ///
    /// Returns an error when `symbol` is unknown or stale, or the channel
    /// call fails. The registry is untouched on error.
    pub async fn update_symbol(
        &mut self,
        symbol: &Symbol,
        changes: SymbolOptions,
    ) -> Result<Symbol, ControllerError> {
        self.require_symbol(symbol)?;
        let merged = symbol.options.merged(&changes);
        self.channel.update_symbol(symbol.id(), &merged).await?;
        let updated = Symbol::new(symbol.id().to_owned(), merged);
        self.symbols.insert(updated.id().to_owned(), updated.clone());
        self.notify_listeners();
        Ok(updated)
    }

    /// Remove a tracked symbol from the renderer and the registry.
    ///
    /// # Errors
    ///
    /// Returns an error when `symbol` is unknown or stale, or the channel
    /// call fails. The registry is untouched on error.
    pub async fn remove_symbol(&mut self, symbol: &Symbol) -> Result<(), ControllerError> {
        self.require_symbol(symbol)?;
        self.channel.remove_symbol(symbol.id()).await?;
        self.symbols.remove(symbol.id());
        self.notify_listeners();
        Ok(())
    }

    /// Remove a batch of tracked symbols, validating every entry before the
    /// first remote call. Listeners fire once at the end.
    ///
    /// # Errors
    ///
    /// Returns an error when any entry is unknown or stale, or a channel
    /// call fails. The registry is untouched on error; removals already
    /// applied by the renderer stand, and the renderer stays authoritative.
    pub async fn remove_symbols(&mut self, symbols: &[Symbol]) -> Result<(), ControllerError> {
        if symbols.is_empty() {
            return Ok(());
        }
        for symbol in symbols {
            self.require_symbol(symbol)?;
        }
        for symbol in symbols {
            self.channel.remove_symbol(symbol.id()).await?;
        }
        for symbol in symbols {
            self.symbols.remove(symbol.id());
        }
        self.notify_listeners();
        Ok(())
    }

    /// Remove every tracked symbol, one channel call per entity in id
    /// order. An empty registry is a no-op without notification.
    ///
    /// # Errors
    ///
    /// Returns an error when a channel call fails. The registry is
    /// untouched on error.
    pub async fn clear_symbols(&mut self) -> Result<(), ControllerError> {
        if self.symbols.is_empty() {
            return Ok(());
        }
        let mut ids: Vec<String> = self.symbols.keys().cloned().collect();
        ids.sort();
        for id in &ids {
            self.channel.remove_symbol(id).await?;
        }
        self.symbols.clear();
        self.notify_listeners();
        Ok(())
    }

    /// Current renderer-side position of a tracked symbol. May differ from
    /// the mirrored options while a drag is in flight.
    ///
    /// # Errors
    ///
    /// Returns an error when `symbol` is unknown or stale, or the channel
    /// call fails.
    pub async fn symbol_position(&self, symbol: &Symbol) -> Result<LngLat, ControllerError> {
        self.require_symbol(symbol)?;
        Ok(self.channel.symbol_geometry(symbol.id()).await?)
    }

    /// Snapshot of all tracked symbols, ordered by id.
    #[must_use]
    pub fn symbols(&self) -> Vec<Symbol> {
        let mut all: Vec<Symbol> = self.symbols.values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    /// Tracked symbol by id.
    #[must_use]
    pub fn symbol(&self, id: &str) -> Option<&Symbol> {
        self.symbols.get(id)
    }

    fn require_symbol(&self, symbol: &Symbol) -> Result<(), ControllerError> {
        match self.symbols.get(symbol.id()) {
            None => Err(ControllerError::UnknownAnnotation {
                kind: AnnotationKind::Symbol,
                id: symbol.id().to_owned(),
            }),
            Some(tracked) if tracked != symbol => Err(ControllerError::StaleAnnotation {
                kind: AnnotationKind::Symbol,
                id: symbol.id().to_owned(),
            }),
            Some(_) => Ok(()),
        }
    }

    // ====== LINES ======

    /// Create one line.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails or returns no id.
    pub async fn add_line(&mut self, options: LineOptions) -> Result<Line, ControllerError> {
        let mut created = self.add_lines(vec![options]).await?;
        let Some(line) = created.pop() else {
            return Err(ChannelError::Call {
                method: "create_lines",
                message: "no id returned".to_owned(),
            }
            .into());
        };
        Ok(line)
    }

    /// Create a batch of lines in one channel call, notifying once.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails or returns a wrong
    /// number of ids.
    pub async fn add_lines(
        &mut self,
        options: Vec<LineOptions>,
    ) -> Result<Vec<Line>, ControllerError> {
        if options.is_empty() {
            return Ok(Vec::new());
        }
        let defaults = LineOptions::defaults();
        let merged: Vec<LineOptions> = options.iter().map(|opts| defaults.merged(opts)).collect();
        let ids = self.channel.create_lines(&merged).await?;
        if ids.len() != merged.len() {
            return Err(batch_size_mismatch("create_lines", merged.len(), ids.len()).into());
        }
        let created: Vec<Line> = ids
            .into_iter()
            .zip(merged)
            .map(|(id, options)| Line::new(id, options))
            .collect();
        for line in &created {
            self.lines.insert(line.id().to_owned(), line.clone());
        }
        self.notify_listeners();
        Ok(created)
    }

    /// Overlay `changes` on a tracked line and return the updated entity.
    ///
    /// # Errors
    ///
    /// Returns an error when `line` is unknown or stale, or the channel
    /// call fails.
    pub async fn update_line(
        &mut self,
        line: &Line,
        changes: LineOptions,
    ) -> Result<Line, ControllerError> {
        self.require_line(line)?;
        let merged = line.options.merged(&changes);
        self.channel.update_line(line.id(), &merged).await?;
        let updated = Line::new(line.id().to_owned(), merged);
        self.lines.insert(updated.id().to_owned(), updated.clone());
        self.notify_listeners();
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns an error when `line` is unknown or stale, or the channel
    /// call fails.
    pub async fn remove_line(&mut self, line: &Line) -> Result<(), ControllerError> {
        self.require_line(line)?;
        self.channel.remove_line(line.id()).await?;
        self.lines.remove(line.id());
        self.notify_listeners();
        Ok(())
    }

    /// Remove a batch of tracked lines, validating every entry first.
    ///
    /// # Errors
    ///
    /// Returns an error when any entry is unknown or stale, or a channel
    /// call fails.
    pub async fn remove_lines(&mut self, lines: &[Line]) -> Result<(), ControllerError> {
        if lines.is_empty() {
            return Ok(());
        }
        for line in lines {
            self.require_line(line)?;
        }
        for line in lines {
            self.channel.remove_line(line.id()).await?;
        }
        for line in lines {
            self.lines.remove(line.id());
        }
        self.notify_listeners();
        Ok(())
    }

    /// Remove every tracked line.
    ///
    /// # Errors
    ///
    /// Returns an error when a channel call fails.
    pub async fn clear_lines(&mut self) -> Result<(), ControllerError> {
        if self.lines.is_empty() {
            return Ok(());
        }
        let mut ids: Vec<String> = self.lines.keys().cloned().collect();
        ids.sort();
        for id in &ids {
            self.channel.remove_line(id).await?;
        }
        self.lines.clear();
        self.notify_listeners();
        Ok(())
    }

    /// Current renderer-side vertices of a tracked line.
    ///
    /// # Errors
    ///
    /// Returns an error when `line` is unknown or stale, or the channel
    /// call fails.
    pub async fn line_vertices(&self, line: &Line) -> Result<Vec<LngLat>, ControllerError> {
        self.require_line(line)?;
        Ok(self.channel.line_geometry(line.id()).await?)
    }

    /// Snapshot of all tracked lines, ordered by id.
    #[must_use]
    pub fn lines(&self) -> Vec<Line> {
        let mut all: Vec<Line> = self.lines.values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    /// Tracked line by id.
    #[must_use]
    pub fn line(&self, id: &str) -> Option<&Line> {
        self.lines.get(id)
    }

    fn require_line(&self, line: &Line) -> Result<(), ControllerError> {
        match self.lines.get(line.id()) {
            None => Err(ControllerError::UnknownAnnotation {
                kind: AnnotationKind::Line,
                id: line.id().to_owned(),
            }),
            Some(tracked) if tracked != line => Err(ControllerError::StaleAnnotation {
                kind: AnnotationKind::Line,
                id: line.id().to_owned(),
            }),
            Some(_) => Ok(()),
        }
    }

    // ====== CIRCLES ======

    /// Create one circle.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails or returns no id.
    pub async fn add_circle(&mut self, options: CircleOptions) -> Result<Circle, ControllerError> {
        let mut created = self.add_circles(vec![options]).await?;
        let Some(circle) = created.pop() else {
            return Err(ChannelError::Call {
                method: "create_circles",
                message: "no id returned".to_owned(),
            }
            .into());
        };
        Ok(circle)
    }

    /// Create a batch of circles in one channel call, notifying once.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails or returns a wrong
    /// number of ids.
    pub async fn add_circles(
        &mut self,
        options: Vec<CircleOptions>,
    ) -> Result<Vec<Circle>, ControllerError> {
        if options.is_empty() {
            return Ok(Vec::new());
        }
        let defaults = CircleOptions::defaults();
        let merged: Vec<CircleOptions> =
            options.iter().map(|opts| defaults.merged(opts)).collect();
        let ids = self.channel.create_circles(&merged).await?;
        if ids.len() != merged.len() {
            return Err(batch_size_mismatch("create_circles", merged.len(), ids.len()).into());
        }
        let created: Vec<Circle> = ids
            .into_iter()
            .zip(merged)
            .map(|(id, options)| Circle::new(id, options))
            .collect();
        for circle in &created {
            self.circles.insert(circle.id().to_owned(), circle.clone());
        }
        self.notify_listeners();
        Ok(created)
    }

    /// Overlay `changes` on a tracked circle and return the updated entity.
    ///
    /// # Errors
    ///
    /// Returns an error when `circle` is unknown or stale, or the channel
    /// call fails.
    pub async fn update_circle(
        &mut self,
        circle: &Circle,
        changes: CircleOptions,
    ) -> Result<Circle, ControllerError> {
        self.require_circle(circle)?;
        let merged = circle.options.merged(&changes);
        self.channel.update_circle(circle.id(), &merged).await?;
        let updated = Circle::new(circle.id().to_owned(), merged);
        self.circles.insert(updated.id().to_owned(), updated.clone());
        self.notify_listeners();
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns an error when `circle` is unknown or stale, or the channel
    /// call fails.
    pub async fn remove_circle(&mut self, circle: &Circle) -> Result<(), ControllerError> {
        self.require_circle(circle)?;
        self.channel.remove_circle(circle.id()).await?;
        self.circles.remove(circle.id());
        self.notify_listeners();
        Ok(())
    }

    /// Remove a batch of tracked circles, validating every entry first.
    ///
    /// # Errors
    ///
    /// Returns an error when any entry is unknown or stale, or a channel
    /// call fails.
    pub async fn remove_circles(&mut self, circles: &[Circle]) -> Result<(), ControllerError> {
        if circles.is_empty() {
            return Ok(());
        }
        for circle in circles {
            self.require_circle(circle)?;
        }
        for circle in circles {
            self.channel.remove_circle(circle.id()).await?;
        }
        for circle in circles {
            self.circles.remove(circle.id());
        }
        self.notify_listeners();
        Ok(())
    }

    /// Remove every tracked circle.
    ///
    /// # Errors
    ///
    /// Returns an error when a channel call fails.
    pub async fn clear_circles(&mut self) -> Result<(), ControllerError> {
        if self.circles.is_empty() {
            return Ok(());
        }
        let mut ids: Vec<String> = self.circles.keys().cloned().collect();
        ids.sort();
        for id in &ids {
            self.channel.remove_circle(id).await?;
        }
        self.circles.clear();
        self.notify_listeners();
        Ok(())
    }

    /// Current renderer-side center of a tracked circle.
    ///
    /// # Errors
    ///
    /// Returns an error when `circle` is unknown or stale, or the channel
    /// call fails.
    pub async fn circle_center(&self, circle: &Circle) -> Result<LngLat, ControllerError> {
        self.require_circle(circle)?;
        Ok(self.channel.circle_geometry(circle.id()).await?)
    }

    /// Snapshot of all tracked circles, ordered by id.
    #[must_use]
    pub fn circles(&self) -> Vec<Circle> {
        let mut all: Vec<Circle> = self.circles.values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    /// Tracked circle by id.
    #[must_use]
    pub fn circle(&self, id: &str) -> Option<&Circle> {
        self.circles.get(id)
    }

    fn require_circle(&self, circle: &Circle) -> Result<(), ControllerError> {
        match self.circles.get(circle.id()) {
            None => Err(ControllerError::UnknownAnnotation {
                kind: AnnotationKind::Circle,
                id: circle.id().to_owned(),
            }),
            Some(tracked) if tracked != circle => Err(ControllerError::StaleAnnotation {
                kind: AnnotationKind::Circle,
                id: circle.id().to_owned(),
            }),
            Some(_) => Ok(()),
        }
    }

    // ====== FILLS ======

    /// Create one fill.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails or returns no id.
    pub async fn add_fill(&mut self, options: FillOptions) -> Result<Fill, ControllerError> {
        let mut created = self.add_fills(vec![options]).await?;
        let Some(fill) = created.pop() else {
            return Err(ChannelError::Call {
                method: "create_fills",
                message: "no id returned".to_owned(),
            }
            .into());
        };
        Ok(fill)
    }

    /// Create a batch of fills in one channel call, notifying once.
    ///
    /// # Errors
    ///
    /// Returns an error when the channel call fails or returns a wrong
    /// number of ids.
    pub async fn add_fills(
        &mut self,
        options: Vec<FillOptions>,
    ) -> Result<Vec<Fill>, ControllerError> {
        if options.is_empty() {
            return Ok(Vec::new());
        }
        let defaults = FillOptions::defaults();
        let merged: Vec<FillOptions> = options.iter().map(|opts| defaults.merged(opts)).collect();
        let ids = self.channel.create_fills(&merged).await?;
        if ids.len() != merged.len() {
            return Err(batch_size_mismatch("create_fills", merged.len(), ids.len()).into());
        }
        let created: Vec<Fill> = ids
            .into_iter()
            .zip(merged)
            .map(|(id, options)| Fill::new(id, options))
            .collect();
        for fill in &created {
            self.fills.insert(fill.id().to_owned(), fill.clone());
        }
        self.notify_listeners();
        Ok(created)
    }

    /// Overlay `changes` on a tracked fill and return the updated entity.
    ///
    /// # Errors
    ///
    /// Returns an error when `fill` is unknown or stale, or the channel
    /// call fails.
    pub async fn update_fill(
        &mut self,
        fill: &Fill,
        changes: FillOptions,
    ) -> Result<Fill, ControllerError> {
        self.require_fill(fill)?;
        let merged = fill.options.merged(&changes);
        self.channel.update_fill(fill.id(), &merged).await?;
        let updated = Fill::new(fill.id().to_owned(), merged);
        self.fills.insert(updated.id().to_owned(), updated.clone());
        self.notify_listeners();
        Ok(updated)
    }

    /// # Errors
    ///
    /// Returns an error when `fill` is unknown or stale, or the channel
    /// call fails.
    pub async fn remove_fill(&mut self, fill: &Fill) -> Result<(), ControllerError> {
        self.require_fill(fill)?;
        self.channel.remove_fill(fill.id()).await?;
        self.fills.remove(fill.id());
        self.notify_listeners();
        Ok(())
    }

    /// Remove a batch of tracked fills, validating every entry first.
    ///
    /// # Errors
    ///
    /// Returns an error when any entry is unknown or stale, or a channel
    /// call fails.
    pub async fn remove_fills(&mut self, fills: &[Fill]) -> Result<(), ControllerError> {
        if fills.is_empty() {
            return Ok(());
        }
        for fill in fills {
            self.require_fill(fill)?;
        }
        for fill in fills {
            self.channel.remove_fill(fill.id()).await?;
        }
        for fill in fills {
            self.fills.remove(fill.id());
        }
        self.notify_listeners();
        Ok(())
    }

    /// Remove every tracked fill.
    ///
    /// # Errors
    ///
    /// Returns an error when a channel call fails.
    pub async fn clear_fills(&mut self) -> Result<(), ControllerError> {
        if self.fills.is_empty() {
            return Ok(());
        }
        let mut ids: Vec<String> = self.fills.keys().cloned().collect();
        ids.sort();
        for id in &ids {
            self.channel.remove_fill(id).await?;
        }
        self.fills.clear();
        self.notify_listeners();
        Ok(())
    }

    /// Current renderer-side rings of a tracked fill.
    ///
    /// # Errors
    ///
    /// Returns an error when `fill` is unknown or stale, or the channel
    /// call fails.
    pub async fn fill_rings(&self, fill: &Fill) -> Result<Vec<Vec<LngLat>>, ControllerError> {
        self.require_fill(fill)?;
        Ok(self.channel.fill_geometry(fill.id()).await?)
    }

    /// Snapshot of all tracked fills, ordered by id.
    #[must_use]
    pub fn fills(&self) -> Vec<Fill> {
        let mut all: Vec<Fill> = self.fills.values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    /// Tracked fill by id.
    #[must_use]
    pub fn fill(&self, id: &str) -> Option<&Fill> {
        self.fills.get(id)
    }

    fn require_fill(&self, fill: &Fill) -> Result<(), ControllerError> {
        match self.fills.get(fill.id()) {
            None => Err(ControllerError::UnknownAnnotation {
                kind: AnnotationKind::Fill,
                id: fill.id().to_owned(),
            }),
            Some(tracked) if tracked != fill => Err(ControllerError::StaleAnnotation {
                kind: AnnotationKind::Fill,
                id: fill.id().to_owned(),
            }),
            Some(_) => Ok(()),
        }
    }
}

fn batch_size_mismatch(method: &'static str, requested: usize, returned: usize) -> ChannelError {
    ChannelError::Call {
        method,
        message: format!("expected {requested} ids, got {returned}"),
    }
}
