#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Two-click rectangle gesture that previews and commits a block of spaces.

use gridsly_core::{Command, Coord, GridRect};

/// Rectangle-select state machine.
///
/// The gesture is idle until the first click anchors a corner. Pointer motion
/// then updates the live corner and refreshes the preview, and the second
/// click commits the rectangle spanned by the anchor and the clicked cell.
#[derive(Clone, Debug, Default)]
pub struct RectangleSelect {
    start: Option<Coord>,
    end: Option<Coord>,
}

impl RectangleSelect {
    /// Creates an idle rectangle gesture.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchor corner recorded by the first click.
    #[must_use]
    pub const fn start(&self) -> Option<Coord> {
        self.start
    }

    /// Live corner following the pointer.
    #[must_use]
    pub const fn end(&self) -> Option<Coord> {
        self.end
    }

    /// Reports whether the first corner has been placed.
    #[must_use]
    pub const fn is_anchored(&self) -> bool {
        self.start.is_some()
    }

    /// Rectangle currently shown as the preview.
    #[must_use]
    pub fn preview(&self) -> Option<GridRect> {
        Some(GridRect::from_corners(self.start?, self.end?))
    }

    /// Advances the gesture with a click on the provided cell.
    ///
    /// Returns the committed rectangle when the click completes the gesture.
    pub fn click(&mut self, cell: Coord, out: &mut Vec<Command>) -> Option<GridRect> {
        let Some(start) = self.start else {
            self.start = Some(cell);
            self.end = None;
            return None;
        };

        out.push(Command::PlaceRectangle {
            first: start,
            second: cell,
        });
        out.push(Command::SetPreview { rect: None });
        self.start = None;
        self.end = None;
        Some(GridRect::from_corners(start, cell))
    }

    /// Tracks pointer motion while anchored.
    ///
    /// Returns `true` when the live corner moved to a different cell.
    pub fn hover(&mut self, cell: Coord, out: &mut Vec<Command>) -> bool {
        let Some(start) = self.start else {
            return false;
        };
        if self.end == Some(cell) {
            return false;
        }

        self.end = Some(cell);
        out.push(Command::SetPreview {
            rect: Some(GridRect::from_corners(start, cell)),
        });
        true
    }

    /// Abandons the gesture without committing.
    pub fn cancel(&mut self, out: &mut Vec<Command>) {
        if self.preview().is_some() {
            out.push(Command::SetPreview { rect: None });
        }
        self.start = None;
        self.end = None;
    }
}
