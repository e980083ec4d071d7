//! The aggregate root: one content tree plus its factories and channels.

use tracing::debug;

use crate::channel::ChannelsManager;
use crate::error::{Conflict, Error, Result};
use crate::events::{SubscriptionId, TreeEvent};
use crate::factory::{NodeFactory, PropertyFactory};
use crate::media::MediaFactory;
use crate::property::Property;
use crate::tree::{NodeId, PresentationId, Tree};

/// A document: the node arena, its current root, the factories used to
/// create nodes and properties, and the channels mappings refer to.
#[derive(Debug)]
pub struct Presentation {
    pub(crate) tree: Tree,
    pub(crate) root: NodeId,
    pub(crate) node_factory: NodeFactory,
    pub(crate) property_factory: PropertyFactory,
    pub(crate) media_factory: MediaFactory,
    pub(crate) channels: ChannelsManager,
}

impl Default for Presentation {
    fn default() -> Self {
        Self::new()
    }
}

impl Presentation {
    /// An empty presentation with the built-in factories and a bare root.
    pub fn new() -> Self {
        let id = PresentationId::next();
        Self::assemble(id, NodeFactory::bound_to(id), PropertyFactory::bound_to(id))
    }

    /// An empty presentation using host factories. Fails if either factory
    /// is already bound to a presentation.
    pub fn with_factories(
        mut node_factory: NodeFactory,
        mut property_factory: PropertyFactory,
    ) -> Result<Self> {
        let id = PresentationId::next();
        node_factory.bind(id)?;
        property_factory.bind(id)?;
        Ok(Self::assemble(id, node_factory, property_factory))
    }

    fn assemble(id: PresentationId, node_factory: NodeFactory, property_factory: PropertyFactory) -> Self {
        let mut tree = Tree::new(id);
        let root = tree.instantiate(node_factory.default_template());
        tree.mark_root(root);
        debug!(presentation = ?id, "created presentation");
        Self {
            tree,
            root,
            node_factory,
            property_factory,
            media_factory: MediaFactory::new(),
            channels: ChannelsManager::new(),
        }
    }

    /// Replace the media factory.
    pub fn with_media_factory(mut self, media_factory: MediaFactory) -> Self {
        self.media_factory = media_factory;
        self
    }

    pub fn id(&self) -> PresentationId {
        self.tree.presentation_id()
    }

    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Make `node` the root and return the previous one, which stays
    /// allocated and may now be inserted like any other detached node.
    pub fn set_root(&mut self, node: NodeId) -> Result<NodeId> {
        if !self.tree.contains(node) {
            return Err(Error::StructuralConflict(Conflict::DifferentPresentation));
        }
        if self.tree.parent(node).is_some() {
            return Err(Error::NotDetached(node));
        }
        self.tree.mark_root(node);
        Ok(std::mem::replace(&mut self.root, node))
    }

    /// A detached node of the base variant.
    pub fn create_node(&mut self) -> NodeId {
        self.tree.instantiate(self.node_factory.default_template())
    }

    /// A detached node of the named variant, or `None` if the name is not
    /// registered.
    pub fn create_node_named(&mut self, local_name: &str, namespace: &str) -> Result<Option<NodeId>> {
        let template = self.node_factory.create(local_name, namespace)?;
        Ok(template.map(|template| self.tree.instantiate(template)))
    }

    /// An unattached property of the named type, or `None`.
    pub fn create_property(&self, local_name: &str, namespace: &str) -> Result<Option<Box<dyn Property>>> {
        self.property_factory.create(local_name, namespace)
    }

    pub fn node_factory(&self) -> &NodeFactory {
        &self.node_factory
    }

    pub fn property_factory(&self) -> &PropertyFactory {
        &self.property_factory
    }

    pub fn media_factory(&self) -> &MediaFactory {
        &self.media_factory
    }

    pub fn media_factory_mut(&mut self) -> &mut MediaFactory {
        &mut self.media_factory
    }

    pub fn channels(&self) -> &ChannelsManager {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut ChannelsManager {
        &mut self.channels
    }

    /// Register a handler for structural change events.
    pub fn subscribe<F>(&mut self, handler: F) -> SubscriptionId
    where
        F: FnMut(&TreeEvent) + 'static,
    {
        self.tree.subscribe(handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.tree.unsubscribe(id)
    }

    /// Same channels and value-equal root subtrees.
    pub fn value_equals(&self, other: &Presentation) -> bool {
        self.channels.channels() == other.channels.channels()
            && self.tree.value_equals(self.root, &other.tree, other.root)
    }
}
