use crate::error::{Result, SelectError};
use crate::model::{Polygon, PolygonId, PolygonSummary, ShapeKind, Vertex};
use std::collections::BTreeMap;

/// Authoritative record of the user's shapes.
///
/// Ids come from a counter that only moves forward, so a deleted id is never
/// handed out again. Iteration is in id order.
#[derive(Clone, Debug, Default)]
pub struct PolygonStore {
    polygons: BTreeMap<PolygonId, Polygon>,
    next_id: u32,
}

impl PolygonStore {
    pub fn new() -> Self {
        Self::default()
    }

    // The counter stops one short of u32::MAX instead of wrapping around.
    fn next_id(&mut self) -> Result<PolygonId> {
        let id = PolygonId(self.next_id);
        self.next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| SelectError::invalid("polygon id space exhausted"))?;
        Ok(id)
    }

    /// New enabled polygon at version 0.
    pub fn create(&mut self, ring: Vec<Vertex>) -> Result<PolygonId> {
        self.create_shape(ShapeKind::Polygon, ring)
    }

    pub fn create_shape(&mut self, kind: ShapeKind, ring: Vec<Vertex>) -> Result<PolygonId> {
        let id = self.next_id()?;
        self.polygons.insert(
            id,
            Polygon {
                id,
                kind,
                ring,
                enabled: true,
                version: 0,
            },
        );
        Ok(id)
    }

    /// Replace the ring and bump the version.
    pub fn update(&mut self, id: PolygonId, ring: Vec<Vertex>) -> Result<u64> {
        let p = self.polygons.get_mut(&id).ok_or(SelectError::NotFound(id))?;
        p.ring = ring;
        p.version += 1;
        Ok(p.version)
    }

    /// Visibility is not geometry: the version is left alone so cached
    /// containment stays valid.
    pub fn set_enabled(&mut self, id: PolygonId, enabled: bool) -> Result<()> {
        let p = self.polygons.get_mut(&id).ok_or(SelectError::NotFound(id))?;
        p.enabled = enabled;
        Ok(())
    }

    pub fn delete(&mut self, id: PolygonId) -> Result<Polygon> {
        self.polygons.remove(&id).ok_or(SelectError::NotFound(id))
    }

    pub fn get(&self, id: PolygonId) -> Option<&Polygon> {
        self.polygons.get(&id)
    }

    pub fn contains(&self, id: PolygonId) -> bool {
        self.polygons.contains_key(&id)
    }

    pub fn list(&self) -> Vec<PolygonSummary> {
        self.polygons.values().map(Polygon::summary).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Polygon> + '_ {
        self.polygons.values()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Polygon> + '_ {
        self.polygons.values().filter(|p| p.enabled)
    }

    pub fn len(&self) -> usize {
        self.polygons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.polygons.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ring_from_pairs;

    fn tri() -> Vec<Vertex> {
        ring_from_pairs(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)])
    }

    #[test]
    fn ids_are_never_reused() {
        let mut s = PolygonStore::new();
        let a = s.create(tri()).unwrap();
        let b = s.create(tri()).unwrap();
        s.delete(a).unwrap();
        let c = s.create(tri()).unwrap();
        assert_ne!(c, a);
        assert_ne!(c, b);
        assert_eq!(s.len(), 2);
    }

    #[test]
    fn update_bumps_version_visibility_does_not() {
        let mut s = PolygonStore::new();
        let a = s.create(tri()).unwrap();
        assert_eq!(s.get(a).unwrap().version, 0);
        assert_eq!(s.update(a, tri()).unwrap(), 1);
        s.set_enabled(a, false).unwrap();
        let p = s.get(a).unwrap();
        assert_eq!(p.version, 1);
        assert!(!p.enabled);
    }

    #[test]
    fn unknown_ids_fail_with_not_found() {
        let mut s = PolygonStore::new();
        let a = s.create(tri()).unwrap();
        s.delete(a).unwrap();
        assert_eq!(s.delete(a).unwrap_err(), SelectError::NotFound(a));
        assert_eq!(s.update(a, tri()).unwrap_err(), SelectError::NotFound(a));
        assert_eq!(s.set_enabled(a, true).unwrap_err(), SelectError::NotFound(a));
    }

    #[test]
    fn list_is_in_id_order() {
        let mut s = PolygonStore::new();
        let ids: Vec<_> = (0..5).map(|_| s.create(tri()).unwrap()).collect();
        s.delete(ids[2]).unwrap();
        s.set_enabled(ids[4], false).unwrap();
        let listed: Vec<_> = s.list().into_iter().map(|r| (r.id, r.enabled)).collect();
        assert_eq!(
            listed,
            vec![(ids[0], true), (ids[1], true), (ids[3], true), (ids[4], false)]
        );
    }

    #[test]
    fn exhausted_id_space_is_an_error() {
        let mut s = PolygonStore::new();
        s.next_id = u32::MAX - 1;
        assert_eq!(s.create(tri()).unwrap(), PolygonId(u32::MAX - 1));
        let err = s.create(tri()).unwrap_err();
        assert_eq!(err.code(), "invalid_input");
        assert_eq!(s.len(), 1);
        // the failed call leaves the counter where it was
        assert!(s.create(tri()).is_err());
    }
}
