/// A request to file `media_id` under `target`, or to uncategorize it when
/// `target` is `None`. Context-menu actions and drops both produce one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRequest {
    pub media_id: String,
    pub target: Option<String>,
}

/// Ephemeral holder for the item being dragged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DragCarrier {
    source: Option<String>,
}

impl DragCarrier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, media_id: impl Into<String>) {
        let media_id = media_id.into();
        tracing::debug!(%media_id, "drag started");
        self.source = Some(media_id);
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn is_dragging(&self) -> bool {
        self.source.is_some()
    }

    /// Read the carried id for a drop on `target`. The carrier keeps its
    /// source until [`DragCarrier::end`].
    pub fn drop_on(&self, target: Option<&str>) -> Option<MoveRequest> {
        self.source.as_ref().map(|media_id| MoveRequest {
            media_id: media_id.clone(),
            target: target.map(str::to_string),
        })
    }

    pub fn end(&mut self) {
        self.source = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_without_drag_is_ignored() {
        let carrier = DragCarrier::new();
        assert_eq!(carrier.drop_on(Some("A")), None);
    }

    #[test]
    fn test_drag_drop_end() {
        let mut carrier = DragCarrier::new();
        carrier.start("m1");
        assert!(carrier.is_dragging());
        assert_eq!(
            carrier.drop_on(Some("A")),
            Some(MoveRequest {
                media_id: "m1".into(),
                target: Some("A".into())
            })
        );
        carrier.end();
        assert_eq!(carrier.source(), None);
        assert_eq!(carrier.drop_on(Some("A")), None);
    }
}
