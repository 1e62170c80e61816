//! Frequency setter capability
//!
//! A voice slot owns exactly one way of retuning its oscillator. That is
//! either one VFO of a CI-V radio or a whole rigctld-managed rig.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWrite;
use vfo_protocol::Vfo;

use crate::civ_link::CivLink;
use crate::error::LinkError;

/// Something that can tune one oscillator to an absolute frequency
#[async_trait]
pub trait FrequencySetter: Send + Sync {
    /// Tune the oscillator to `hz`
    async fn set_frequency(&self, hz: u64) -> Result<(), LinkError>;

    /// Human-readable description for logs
    fn describe(&self) -> String;
}

#[async_trait]
impl<S> FrequencySetter for Arc<S>
where
    S: FrequencySetter + ?Sized,
{
    async fn set_frequency(&self, hz: u64) -> Result<(), LinkError> {
        (**self).set_frequency(hz).await
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// One VFO of a shared CI-V link
pub struct VfoSetter<T> {
    link: Arc<CivLink<T>>,
    vfo: Vfo,
}

impl<T> VfoSetter<T> {
    /// Bind a VFO of `link`
    pub fn new(link: Arc<CivLink<T>>, vfo: Vfo) -> Self {
        Self { link, vfo }
    }

    /// The VFO this setter drives
    pub fn vfo(&self) -> Vfo {
        self.vfo
    }
}

impl<T> Clone for VfoSetter<T> {
    fn clone(&self) -> Self {
        Self {
            link: Arc::clone(&self.link),
            vfo: self.vfo,
        }
    }
}

#[async_trait]
impl<T> FrequencySetter for VfoSetter<T>
where
    T: AsyncWrite + Unpin + Send,
{
    async fn set_frequency(&self, hz: u64) -> Result<(), LinkError> {
        self.link.set_vfo(self.vfo, hz).await
    }

    fn describe(&self) -> String {
        format!("{} VFO {}", self.link.name(), self.vfo.name())
    }
}
