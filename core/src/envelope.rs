//! Identity, load state and client link shared by every resource.
//!
//! # Design
//! A resource starts either bare (ID only, `Unloaded`) or hydrated from an
//! API response (`Loaded`). The link back to the client is a `Weak`
//! reference: resources use it for follow-up calls but never keep the client
//! alive, and a resource decoded outside of a client simply has no link.
//!
//! [`Expandable::expand`] takes `&mut self`, so two callers cannot hydrate
//! the same in-memory object at once without going through their own lock.

use std::fmt;
use std::sync::Weak;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::client::{Client, ClientInner};
use crate::error::ApiError;
use crate::options::Options;

/// Whether a resource carries its full field set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoadState {
    #[default]
    Unloaded,
    Loaded,
}

/// Embedded into every resource. Only `gid` travels over the wire.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct Envelope {
    #[serde(default)]
    gid: String,
    #[serde(skip)]
    state: LoadState,
    #[serde(skip)]
    client: Weak<ClientInner>,
}

impl Envelope {
    /// A bare handle: ID only, not yet loaded.
    pub fn new(gid: impl Into<String>, client: &Client) -> Self {
        Self {
            gid: gid.into(),
            state: LoadState::Unloaded,
            client: client.downgrade(),
        }
    }

    /// Handle for a resource just decoded from one of `client`'s responses.
    pub(crate) fn loaded(gid: impl Into<String>, client: &Client) -> Self {
        Self {
            gid: gid.into(),
            state: LoadState::Loaded,
            client: client.downgrade(),
        }
    }

    pub fn gid(&self) -> &str {
        &self.gid
    }

    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_loaded(&self) -> bool {
        self.state == LoadState::Loaded
    }

    /// The client this resource was created through.
    pub fn client(&self) -> Result<Client, ApiError> {
        Client::upgrade(&self.client).ok_or_else(|| {
            ApiError::Configuration(format!("resource {} is not attached to a live client", self.gid))
        })
    }

    /// Mark as fully loaded through `client`, keeping the ID.
    pub(crate) fn attach(&mut self, client: &Client) {
        self.state = LoadState::Loaded;
        self.client = client.downgrade();
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("gid", &self.gid)
            .field("state", &self.state)
            .field("attached", &(self.client.strong_count() > 0))
            .finish()
    }
}

/// Equality is identity plus load state; the client link is ignored.
impl PartialEq for Envelope {
    fn eq(&self, other: &Self) -> bool {
        self.gid == other.gid && self.state == other.state
    }
}

/// A resource with a canonical `/<collection>/<gid>` path that can be
/// hydrated on first access.
pub trait Expandable: DeserializeOwned {
    /// Collection segment of the canonical path, e.g. `workspaces`.
    const COLLECTION: &'static str;

    fn envelope(&self) -> &Envelope;

    fn envelope_mut(&mut self) -> &mut Envelope;

    fn gid(&self) -> &str {
        self.envelope().gid()
    }

    fn path(&self) -> String {
        format!("/{}/{}", Self::COLLECTION, self.gid())
    }

    /// Load the full record unless already loaded. See [`expand_with`].
    ///
    /// [`expand_with`]: Expandable::expand_with
    fn expand(&mut self) -> Result<(), ApiError> {
        self.expand_with(&[])
    }

    /// Load the full record with a single GET, replacing the receiver in
    /// place. A loaded resource returns immediately without a request. On
    /// failure the receiver is left untouched and still unloaded.
    fn expand_with(&mut self, options: &[Options]) -> Result<(), ApiError> {
        if self.envelope().is_loaded() {
            return Ok(());
        }
        if self.gid().is_empty() {
            return Err(ApiError::Logic(format!(
                "cannot expand a {} resource without an ID",
                Self::COLLECTION
            )));
        }
        let client = self.envelope().client()?;
        trace!(collection = Self::COLLECTION, gid = %self.gid(), "loading details");

        let (mut loaded, _): (Self, _) = client.get(&self.path(), options)?;
        *loaded.envelope_mut() = Envelope::loaded(self.gid(), &client);
        *self = loaded;
        Ok(())
    }
}

/// Mark every item of a freshly decoded response as loaded through `client`.
pub(crate) fn hydrate<R: Expandable>(client: &Client, items: &mut [R]) {
    for item in items {
        item.envelope_mut().attach(client);
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::client::testing::{client, ScriptedTransport};
    use crate::Workspace;

    #[test]
    fn new_handle_is_unloaded_and_attached() {
        let transport = ScriptedTransport::default();
        let c = client(&transport);
        let envelope = Envelope::new("42", &c);
        assert_eq!(envelope.gid(), "42");
        assert_eq!(envelope.state(), LoadState::Unloaded);
        assert!(envelope.client().is_ok());
    }

    #[test]
    fn expand_twice_makes_one_request() {
        let transport = ScriptedTransport::default();
        transport.respond(200, json!({"data": {"gid": "42", "name": "Acme", "is_organization": true}}));
        let c = client(&transport);

        let mut ws = c.workspace("42");
        ws.expand().unwrap();
        ws.expand().unwrap();

        assert_eq!(transport.calls(), 1);
        assert!(ws.envelope().is_loaded());
        assert_eq!(ws.name, "Acme");
        assert!(ws.is_organization);
        assert_eq!(transport.requests()[0].url, "http://localhost:3000/workspaces/42");
    }

    #[test]
    fn failed_expand_stays_unloaded() {
        let transport = ScriptedTransport::default();
        transport.fail("timed out");
        transport.respond(200, json!({"data": {"gid": "42", "name": "Acme"}}));
        let c = client(&transport);

        let mut ws = c.workspace("42");
        let err = ws.expand().unwrap_err();
        assert!(err.is_transport());
        assert_eq!(ws.envelope().state(), LoadState::Unloaded);
        assert_eq!(ws.name, "");

        ws.expand().unwrap();
        assert_eq!(transport.calls(), 2);
        assert_eq!(ws.name, "Acme");
    }

    #[test]
    fn expand_keeps_the_original_id() {
        let transport = ScriptedTransport::default();
        transport.respond(200, json!({"data": {"name": "No gid in payload"}}));
        let c = client(&transport);

        let mut ws = c.workspace("7");
        ws.expand().unwrap();
        assert_eq!(ws.gid(), "7");
    }

    #[test]
    fn expand_without_id_is_a_logic_error() {
        let transport = ScriptedTransport::default();
        let c = client(&transport);
        let mut ws = c.workspace("");
        assert!(matches!(ws.expand(), Err(ApiError::Logic(_))));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn detached_resource_is_a_configuration_error() {
        let mut ws: Workspace = serde_json::from_value(json!({"gid": "9", "name": "Orphan"})).unwrap();
        assert_eq!(ws.envelope().state(), LoadState::Unloaded);
        assert!(matches!(ws.expand(), Err(ApiError::Configuration(_))));
    }

    #[test]
    fn dropped_client_leaves_dead_link() {
        let transport = ScriptedTransport::default();
        let mut ws = client(&transport).workspace("9");
        assert!(matches!(ws.expand(), Err(ApiError::Configuration(_))));
        assert_eq!(transport.calls(), 0);
    }

    #[test]
    fn expand_with_forwards_field_selection() {
        let transport = ScriptedTransport::default();
        transport.respond(200, json!({"data": {"gid": "42", "name": "Acme"}}));
        let c = client(&transport);

        let mut ws = c.workspace("42");
        ws.expand_with(&[Options::fields(["name"])]).unwrap();
        assert_eq!(
            transport.requests()[0].url,
            "http://localhost:3000/workspaces/42?opt_fields=name"
        );
    }

    #[test]
    fn only_gid_is_serialized() {
        let transport = ScriptedTransport::default();
        let c = client(&transport);
        let value = serde_json::to_value(Envelope::new("5", &c)).unwrap();
        assert_eq!(value, json!({"gid": "5"}));
    }
}
