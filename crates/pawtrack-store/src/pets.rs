//! The signed-in user's pets and the weight history of the focused one.

use std::sync::Arc;

use pawtrack_core::{Gateway, Scope, pet::{Pet, WeightRecord}};
use uuid::Uuid;

use crate::{entity::EntityStore, error::MutationResult};

pub struct PetStore<G> {
  pets:    EntityStore<G, Pet>,
  weights: EntityStore<G, WeightRecord>,
}

impl<G: Gateway> PetStore<G> {
  pub fn new(gateway: Arc<G>) -> Self {
    Self {
      pets:    EntityStore::new(gateway.clone()),
      weights: EntityStore::new(gateway),
    }
  }

  pub fn pets(&self) -> &EntityStore<G, Pet> { &self.pets }

  /// Weight history of the focused pet, oldest first.
  pub fn weights(&self) -> &EntityStore<G, WeightRecord> { &self.weights }

  pub fn selected_pet(&self) -> Option<Pet> { self.pets.selected() }

  /// Reload the pets and, if one is still focused, its weight history.
  pub async fn refresh(&self) {
    self.pets.load(Scope::CurrentUser).await;
    match self.pets.selection().id() {
      Some(id) => self.weights.load(Scope::Parent(id)).await,
      None => self.weights.clear(),
    }
  }

  /// Focus a pet and load its weight history, or clear both with `None`.
  pub async fn focus(&self, id: Option<Uuid>) -> MutationResult<()> {
    self.pets.select(id)?;
    match id {
      Some(id) => self.weights.load(Scope::Parent(id)).await,
      None => self.weights.clear(),
    }
    Ok(())
  }

  /// Delete a pet. Its weight history goes with it if it was on display.
  pub async fn delete_pet(&self, id: Uuid) -> MutationResult<()> {
    self.pets.delete(id).await?;
    if self.weights.scope() == Some(Scope::Parent(id)) {
      self.weights.clear();
    }
    Ok(())
  }
}
