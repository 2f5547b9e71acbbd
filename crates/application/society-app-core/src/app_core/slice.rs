use super::actions::SlicePhase;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Idle,
    Pending,
    Complete,
    Failed,
}

/// State of one asynchronous request family.
///
/// `error` is set only while `Failed`. A request clears it but keeps the last
/// data around so screens can keep rendering it.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceState<D> {
    pub data: D,
    pub error: Option<String>,
    pub status: Status,
}

impl<D: Default> Default for SliceState<D> {
    fn default() -> Self {
        Self {
            data: D::default(),
            error: None,
            status: Status::Idle,
        }
    }
}

impl<D: Default> SliceState<D> {
    pub fn is_pending(&self) -> bool {
        self.status == Status::Pending
    }

    /// Applies one phase. Success and failure only land on a pending slice;
    /// returns whether the phase changed anything.
    pub fn apply<Req, Res>(
        &mut self,
        phase: &SlicePhase<Req, Res>,
        data: impl FnOnce(&Res) -> D,
    ) -> bool {
        match phase {
            SlicePhase::Request(_) => {
                self.status = Status::Pending;
                self.error = None;
                true
            }
            SlicePhase::Success(res) if self.is_pending() => {
                self.data = data(res);
                self.status = Status::Complete;
                self.error = None;
                true
            }
            SlicePhase::Failure(message) if self.is_pending() => {
                self.status = Status::Failed;
                self.error = Some(message.clone());
                true
            }
            SlicePhase::Success(_) | SlicePhase::Failure(_) => false,
            SlicePhase::Reset => {
                *self = Self::default();
                true
            }
        }
    }
}
