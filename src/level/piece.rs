use std::collections::BTreeMap;

use glam::Vec2;
use serde::{Serialize, Deserialize};

use crate::error::EditError;
use crate::palette::template::{PieceTemplate, PropertyValue};

/// Opaque id of an instantiated piece.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PieceHandle(pub u64);

/// The object-lifecycle side of the editor: creates and destroys piece
/// instances and owns their live positions.
pub trait PieceHost {
    fn instantiate(&mut self, template: &PieceTemplate, name: String, position: Vec2) -> Result<PieceHandle, EditError>;
    fn destroy(&mut self, piece: PieceHandle);
    fn position(&self, piece: PieceHandle) -> Option<Vec2>;
    fn set_position(&mut self, piece: PieceHandle, position: Vec2);
}

/// A placed piece in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PieceInstance {
    pub name: String,
    pub template_id: String,
    pub position: Vec2,
    pub properties: BTreeMap<String, PropertyValue>,
}

/// In-app piece host. Instances are keyed by handle; handles are never reused.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct PieceWorld {
    next_id: u64,
    instances: BTreeMap<PieceHandle, PieceInstance>,
}

impl PieceWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, piece: PieceHandle) -> Option<&PieceInstance> {
        self.instances.get(&piece)
    }

    pub fn get_mut(&mut self, piece: PieceHandle) -> Option<&mut PieceInstance> {
        self.instances.get_mut(&piece)
    }

    pub fn iter(&self) -> impl Iterator<Item = (PieceHandle, &PieceInstance)> {
        self.instances.iter().map(|(h, i)| (*h, i))
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    /// The handle counter must be past every live handle, or the next
    /// instantiate would overwrite an existing piece.
    pub fn check(&self) -> Result<(), String> {
        match self.instances.keys().next_back() {
            Some(last) if last.0 >= self.next_id => Err(format!(
                "Piece counter {} is not past the largest handle {}",
                self.next_id, last.0
            )),
            _ => Ok(()),
        }
    }

    #[cfg(test)]
    pub(crate) fn set_next_id(&mut self, next_id: u64) {
        self.next_id = next_id;
    }
}

impl PieceHost for PieceWorld {
    fn instantiate(&mut self, template: &PieceTemplate, name: String, position: Vec2) -> Result<PieceHandle, EditError> {
        if template.id.is_empty() {
            return Err(EditError::Instantiate(format!("template '{}' has no id", template.name)));
        }
        self.next_id += 1;
        let handle = PieceHandle(self.next_id);
        self.instances.insert(handle, PieceInstance {
            name,
            template_id: template.id.clone(),
            position,
            properties: template.properties.clone(),
        });
        Ok(handle)
    }

    fn destroy(&mut self, piece: PieceHandle) {
        if self.instances.remove(&piece).is_none() {
            log::debug!("destroy of unknown piece {piece:?}");
        }
    }

    fn position(&self, piece: PieceHandle) -> Option<Vec2> {
        self.instances.get(&piece).map(|i| i.position)
    }

    fn set_position(&mut self, piece: PieceHandle, position: Vec2) {
        if let Some(instance) = self.instances.get_mut(&piece) {
            instance.position = position;
        }
    }
}
