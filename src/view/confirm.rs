/// Destructive actions wait here until the operator confirms them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Delete(String),
    Wipe,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Execute(Action),
    /// Wipe-all needs a second confirmation.
    AskAgain,
    Nothing,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Pending {
    Delete(String),
    Wipe { confirmed: u8 },
}

const WIPE_CONFIRMATIONS: u8 = 2;

#[derive(Debug, Default)]
pub struct Confirmations {
    pending: Option<Pending>,
}

impl Confirmations {
    pub fn request_delete(&mut self, id: &str) {
        self.pending = Some(Pending::Delete(id.to_string()));
    }

    pub fn request_wipe(&mut self) {
        self.pending = Some(Pending::Wipe { confirmed: 0 });
    }

    pub fn confirm(&mut self) -> Step {
        match self.pending.take() {
            None => Step::Nothing,
            Some(Pending::Delete(id)) => Step::Execute(Action::Delete(id)),
            Some(Pending::Wipe { confirmed }) if confirmed + 1 >= WIPE_CONFIRMATIONS => {
                Step::Execute(Action::Wipe)
            }
            Some(Pending::Wipe { confirmed }) => {
                self.pending = Some(Pending::Wipe {
                    confirmed: confirmed + 1,
                });
                Step::AskAgain
            }
        }
    }

    /// True when something was pending.
    pub fn cancel(&mut self) -> bool {
        self.pending.take().is_some()
    }
}
