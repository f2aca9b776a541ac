use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Idle,
    /// Input was refused before anything was submitted.
    Rejected(String),
    Working(String),
    Done(String),
    Failed(String),
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => Ok(()),
            Self::Rejected(msg) | Self::Working(msg) | Self::Done(msg) => f.write_str(msg),
            Self::Failed(msg) => write!(f, "error: {msg}"),
        }
    }
}

/// The visible status of one page. Shared between the page and the callbacks
/// of its tasks; lives on the owning thread only.
#[derive(Debug, Clone, Default)]
pub struct StatusLine(Rc<RefCell<Status>>);

impl StatusLine {
    pub fn get(&self) -> Status {
        self.0.borrow().clone()
    }

    pub fn set(&self, status: Status) {
        *self.0.borrow_mut() = status;
    }
}
