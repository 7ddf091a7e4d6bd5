/// State of the "New Collection" dialog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CreateCollectionDialog {
    pub open: bool,
    pub name: String,
    pub error: Option<String>,
    pub submitting: bool,
}

impl CreateCollectionDialog {
    pub fn show(&mut self) {
        self.open = true;
        self.error = None;
    }

    pub fn close(&mut self) {
        *self = Self::default();
    }
}
