use crate::geometry::{project, DisplaySize, PixelRect};
use crate::prediction::{filter_confident, Prediction};
use crate::sorting::{sorted_view, SortMode};
use crate::uploader::{validate_filename, UploadError};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    List,
    Grid,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ViewMode::List => "list",
            ViewMode::Grid => "grid",
        }
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "list" => Ok(Self::List),
            "grid" => Ok(Self::Grid),
            other => Err(format!(
                "{} is not a supported view mode. Use either `list` or `grid`.",
                other
            )),
        }
    }
}

/// Visual tier of a detection row or overlay. A detection is in exactly one
/// tier; selection wins over hover.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emphasis {
    Selected,
    Hovered,
    Default,
}

/// Identifies one upload attempt. Results carrying a stale token are
/// discarded, so overlapping uploads resolve newest-wins instead of
/// last-resolved-wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadToken(u64);

/// The image currently on screen. Replacing it drops the previous preview
/// resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub filename: String,
}

/// Per-page-load interaction state: one logical writer, no persistence.
/// Hover and selection always index the ORIGINAL detection array, never a
/// sorted view.
#[derive(Debug, Default)]
pub struct Session {
    image: Option<PreviewImage>,
    display: Option<DisplaySize>,
    detections: Vec<Prediction>,
    loading: bool,
    error: Option<String>,
    hovered: Option<usize>,
    selected: Option<usize>,
    sort_mode: SortMode,
    view_mode: ViewMode,
    upload_seq: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new upload. Prior error and detection state is cleared
    /// before validation, so error and success states never coexist from
    /// different uploads. A rejected file records the validation error and
    /// never enters the loading state.
    pub fn begin_upload(&mut self, filename: &str) -> Result<UploadToken, UploadError> {
        self.error = None;
        self.detections.clear();
        self.hovered = None;
        self.selected = None;
        self.display = None;
        self.image = None;

        if let Err(e) = validate_filename(filename) {
            self.error = Some(e.to_string());
            return Err(e);
        }

        self.image = Some(PreviewImage {
            filename: filename.to_owned(),
        });
        self.loading = true;
        self.upload_seq += 1;
        Ok(UploadToken(self.upload_seq))
    }

    /// Installs the detections for the upload identified by `token`. A
    /// stale token means a newer upload has begun; its result is dropped.
    pub fn finish_upload(&mut self, token: UploadToken, predictions: Vec<Prediction>) -> bool {
        if !self.is_current(token) {
            tracing::debug!("Dropping stale upload result");
            return false;
        }

        self.detections = filter_confident(predictions);
        self.loading = false;
        self.error = None;
        true
    }

    /// Records a failed upload. Stale failures are dropped the same way as
    /// stale results.
    pub fn fail_upload(&mut self, token: UploadToken, message: &str) -> bool {
        if !self.is_current(token) {
            tracing::debug!("Dropping stale upload failure");
            return false;
        }

        self.detections.clear();
        self.loading = false;
        self.error = Some(message.to_owned());
        true
    }

    fn is_current(&self, token: UploadToken) -> bool {
        token == UploadToken(self.upload_seq)
    }

    /// Records the rendered pixel size of the image, available only once
    /// decode completes. Overlay geometry is derived from the latest
    /// measurement, so a re-measure remaps every rectangle.
    pub fn measure_display(&mut self, width: f32, height: f32) {
        self.display = DisplaySize::new(width, height);
    }

    pub fn hover_enter(&mut self, index: usize) {
        if index < self.detections.len() {
            self.hovered = Some(index);
        }
    }

    pub fn hover_leave(&mut self) {
        self.hovered = None;
    }

    /// Click on a detection, from the list panel or the image overlay
    /// alike: selecting the selected index clears it, anything else moves
    /// the single selection there.
    pub fn toggle_select(&mut self, index: usize) {
        if index >= self.detections.len() {
            return;
        }
        if self.selected == Some(index) {
            self.selected = None;
        } else {
            self.selected = Some(index);
        }
    }

    /// Reorders the displayed list only; hover and selection are untouched.
    pub fn set_sort_mode(&mut self, mode: SortMode) {
        self.sort_mode = mode;
    }

    /// Presentation density only; no other state changes.
    pub fn set_view_mode(&mut self, mode: ViewMode) {
        self.view_mode = mode;
    }

    pub fn emphasis(&self, index: usize) -> Emphasis {
        if self.selected == Some(index) {
            Emphasis::Selected
        } else if self.hovered == Some(index) {
            Emphasis::Hovered
        } else {
            Emphasis::Default
        }
    }

    /// The displayed ordering: (original index, prediction) pairs.
    pub fn visible(&self) -> Vec<(usize, &Prediction)> {
        sorted_view(&self.detections, self.sort_mode)
    }

    /// Overlay rectangles in original array order. Empty until the display
    /// has been measured.
    pub fn overlays(&self) -> Vec<(usize, PixelRect)> {
        self.detections
            .iter()
            .enumerate()
            .filter_map(|(index, p)| {
                project(&p.bounding_box, self.display).map(|rect| (index, rect))
            })
            .collect()
    }

    pub fn overlay_rect(&self, index: usize) -> Option<PixelRect> {
        let prediction = self.detections.get(index)?;
        project(&prediction.bounding_box, self.display)
    }

    pub fn image(&self) -> Option<&PreviewImage> {
        self.image.as_ref()
    }

    pub fn display(&self) -> Option<DisplaySize> {
        self.display
    }

    pub fn detections(&self) -> &[Prediction] {
        &self.detections
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn hovered(&self) -> Option<usize> {
        self.hovered
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prediction::BoundingBox;

    fn prediction(tag_name: &str, probability: f32) -> Prediction {
        Prediction {
            tag_id: format!("tag-{}", tag_name),
            tag_name: tag_name.to_string(),
            probability,
            bounding_box: BoundingBox {
                left: 0.1,
                top: 0.2,
                width: 0.3,
                height: 0.4,
            },
        }
    }

    fn session_with_detections() -> Session {
        let mut session = Session::new();
        let token = session.begin_upload("photo.jpg").unwrap();
        session.finish_upload(
            token,
            vec![
                prediction("dent", 0.92),
                prediction("scratch", 0.55),
                prediction("no_damage", 0.3),
            ],
        );
        session
    }

    #[test]
    fn finish_upload_holds_only_confident_detections() {
        let session = session_with_detections();

        let names: Vec<&str> = session
            .detections()
            .iter()
            .map(|p| p.tag_name.as_str())
            .collect();
        assert_eq!(names, vec!["dent", "scratch"]);
        assert!(!session.loading());
        assert_eq!(session.error(), None);
    }

    #[test]
    fn rejected_file_never_enters_loading() {
        let mut session = Session::new();

        let result = session.begin_upload("photo.gif");

        assert!(matches!(result, Err(UploadError::UnsupportedFileType)));
        assert!(!session.loading());
        assert!(session.error().is_some());
        assert!(session.image().is_none());
        assert!(session.detections().is_empty());
    }

    #[test]
    fn beginning_an_upload_clears_previous_state() {
        let mut session = session_with_detections();
        session.measure_display(800.0, 600.0);
        session.hover_enter(0);
        session.toggle_select(1);

        let token = session.begin_upload("next.png").unwrap();

        assert!(session.loading());
        assert!(session.detections().is_empty());
        assert_eq!(session.hovered(), None);
        assert_eq!(session.selected(), None);
        assert_eq!(session.display(), None);
        assert_eq!(session.error(), None);
        assert_eq!(session.image().unwrap().filename, "next.png");

        session.finish_upload(token, vec![prediction("rust", 0.8)]);
        assert_eq!(session.detections().len(), 1);
    }

    #[test]
    fn relay_failure_shows_generic_error_and_clears_loading() {
        let mut session = Session::new();
        let token = session.begin_upload("photo.jpg").unwrap();

        session.fail_upload(token, "Prediction failed. Please try again.");

        assert_eq!(session.error(), Some("Prediction failed. Please try again."));
        assert!(session.detections().is_empty());
        assert!(!session.loading());
    }

    #[test]
    fn stale_results_are_discarded() {
        let mut session = Session::new();
        let first = session.begin_upload("first.jpg").unwrap();
        let second = session.begin_upload("second.jpg").unwrap();

        let applied = session.finish_upload(first, vec![prediction("dent", 0.9)]);
        assert!(!applied);
        assert!(session.detections().is_empty());
        assert!(session.loading());

        assert!(session.finish_upload(second, vec![prediction("scratch", 0.6)]));
        assert_eq!(session.detections()[0].tag_name, "scratch");
        assert!(!session.loading());
    }

    #[test]
    fn stale_failures_are_discarded() {
        let mut session = Session::new();
        let first = session.begin_upload("first.jpg").unwrap();
        let second = session.begin_upload("second.jpg").unwrap();

        assert!(!session.fail_upload(first, "Prediction failed. Please try again."));
        assert_eq!(session.error(), None);

        assert!(session.finish_upload(second, vec![prediction("dent", 0.9)]));
        assert_eq!(session.detections().len(), 1);
    }

    #[test]
    fn select_toggle_law() {
        let mut session = session_with_detections();

        session.toggle_select(1);
        assert_eq!(session.selected(), Some(1));

        session.toggle_select(1);
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn selection_is_exclusive() {
        let mut session = session_with_detections();

        session.toggle_select(0);
        session.toggle_select(1);

        assert_eq!(session.selected(), Some(1));
    }

    #[test]
    fn hover_enter_and_leave() {
        let mut session = session_with_detections();

        session.hover_enter(0);
        assert_eq!(session.hovered(), Some(0));

        session.hover_leave();
        assert_eq!(session.hovered(), None);
    }

    #[test]
    fn out_of_range_indices_are_ignored() {
        let mut session = session_with_detections();

        session.hover_enter(10);
        session.toggle_select(10);

        assert_eq!(session.hovered(), None);
        assert_eq!(session.selected(), None);
    }

    #[test]
    fn sorting_does_not_disturb_hover_or_selection() {
        let mut session = session_with_detections();
        session.hover_enter(0);
        session.toggle_select(1);

        session.set_sort_mode(SortMode::Name);

        assert_eq!(session.hovered(), Some(0));
        assert_eq!(session.selected(), Some(1));
        // The view reorders, the indices it carries stay original.
        let view = session.visible();
        assert_eq!(view[0].0, 0);
        assert_eq!(view[0].1.tag_name, "dent");
    }

    #[test]
    fn view_mode_changes_nothing_else() {
        let mut session = session_with_detections();
        session.toggle_select(0);

        session.set_view_mode(ViewMode::Grid);

        assert_eq!(session.view_mode(), ViewMode::Grid);
        assert_eq!(session.selected(), Some(0));
        assert_eq!(session.detections().len(), 2);
    }

    #[test]
    fn selection_takes_precedence_over_hover() {
        let mut session = session_with_detections();
        session.hover_enter(0);
        session.toggle_select(0);

        assert_eq!(session.emphasis(0), Emphasis::Selected);
        assert_eq!(session.emphasis(1), Emphasis::Default);

        session.hover_enter(1);
        assert_eq!(session.emphasis(1), Emphasis::Hovered);
    }

    #[test]
    fn overlays_appear_only_after_measurement() {
        let mut session = session_with_detections();
        assert!(session.overlays().is_empty());
        assert_eq!(session.overlay_rect(0), None);

        session.measure_display(800.0, 600.0);

        let overlays = session.overlays();
        assert_eq!(overlays.len(), 2);
        assert_eq!(overlays[0].0, 0);
        assert_eq!(overlays[0].1.left, 80.0);
        assert_eq!(overlays[0].1.top, 120.0);
    }

    #[test]
    fn remeasure_remaps_overlays() {
        let mut session = session_with_detections();
        session.measure_display(400.0, 300.0);
        let before = session.overlay_rect(0).unwrap();

        session.measure_display(800.0, 300.0);
        let after = session.overlay_rect(0).unwrap();

        assert_eq!(after.left, before.left * 2.0);
        assert_eq!(after.width, before.width * 2.0);
        assert_eq!(after.top, before.top);
    }
}
