//! Group arena holding every parameter of a C3D directory.
//!
//! Groups are addressed by their creation index; the negative wire ids of the
//! file format are only produced when records are serialized.

use std::collections::HashMap;

use crate::blocks::parameter_block::{Parameter, ParameterGroup, ParameterValue};
use crate::error::C3dError;

/// Position of a parameter inside the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterSlot {
    pub group: usize,
    pub index: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ParameterStore {
    groups: Vec<ParameterGroup>,
    group_index: HashMap<String, usize>,
}

/// Splits `GROUP:NAME` into its two non-empty segments.
pub fn split_path(path: &str) -> Result<(&str, &str), C3dError> {
    let mut parts = path.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(group), Some(name), None) if !group.is_empty() && !name.is_empty() => Ok((group, name)),
        _ => Err(C3dError::InvalidPath(path.to_string())),
    }
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` under `group:name`.
    ///
    /// Missing groups and parameters are only created when `can_create` is
    /// set (the file is closed); otherwise this is [`ParameterStore::update`].
    pub fn set(
        &mut self,
        group: &str,
        name: &str,
        value: ParameterValue,
        can_create: bool,
    ) -> Result<ParameterSlot, C3dError> {
        if can_create {
            Ok(self.insert(group, name, value))
        } else {
            self.update(group, name, value)
        }
    }

    /// Creates or replaces `group:name`, creating the group when needed.
    pub fn insert(&mut self, group: &str, name: &str, value: ParameterValue) -> ParameterSlot {
        let group_idx = match self.group_index.get(group) {
            Some(idx) => *idx,
            None => self.push_group(ParameterGroup::new(group)),
        };
        let parameters = &mut self.groups[group_idx].parameters;
        match parameters.iter().position(|p| p.name == name) {
            Some(index) => {
                parameters[index].value = value;
                ParameterSlot { group: group_idx, index }
            }
            None => {
                parameters.push(Parameter::new(name, value, group_idx));
                ParameterSlot { group: group_idx, index: parameters.len() - 1 }
            }
        }
    }

    /// Replaces the value of an existing parameter with one of identical
    /// shape, so its serialized record keeps its size.
    pub fn update(&mut self, group: &str, name: &str, value: ParameterValue) -> Result<ParameterSlot, C3dError> {
        let group_idx = *self.group_index.get(group).ok_or_else(|| {
            C3dError::Lifecycle(format!("cannot create parameter group {} after the file was opened", group))
        })?;
        let parameters = &mut self.groups[group_idx].parameters;
        let index = parameters.iter().position(|p| p.name == name).ok_or_else(|| {
            C3dError::Lifecycle(format!("cannot create parameter {}:{} after the file was opened", group, name))
        })?;

        let parameter = &mut parameters[index];
        if !parameter.value.same_shape(&value) {
            return Err(C3dError::ShapeMismatch {
                path:     format!("{}:{}", group, name),
                expected: parameter.value.shape(),
                found:    value.shape(),
            });
        }
        parameter.value = value;
        Ok(ParameterSlot { group: group_idx, index })
    }

    /// Appends a group and returns its index. A group with the same name is
    /// replaced in the lookup map but stays in the arena.
    pub fn push_group(&mut self, group: ParameterGroup) -> usize {
        let idx = self.groups.len();
        self.group_index.insert(group.name.clone(), idx);
        self.groups.push(group);
        idx
    }

    /// Removes a group and its parameters. Later groups move down one index.
    pub fn remove_group(&mut self, name: &str) -> Option<ParameterGroup> {
        let idx = self.group_index.remove(name)?;
        let removed = self.groups.remove(idx);
        self.group_index.clear();
        for (idx, group) in self.groups.iter_mut().enumerate() {
            self.group_index.insert(group.name.clone(), idx);
            for parameter in &mut group.parameters {
                parameter.group_index = idx;
            }
        }
        Some(removed)
    }

    /// Appends a parsed parameter to the group at `group`, replacing an
    /// earlier parameter of the same name.
    pub fn push_parameter(&mut self, group: usize, mut parameter: Parameter) -> Result<(), C3dError> {
        let target = self.groups.get_mut(group).ok_or_else(|| {
            C3dError::BlockSerializationError(format!("parameter {} references unknown group {}", parameter.name, group))
        })?;
        parameter.group_index = group;
        match target.parameters.iter_mut().find(|p| p.name == parameter.name) {
            Some(existing) => *existing = parameter,
            None => target.parameters.push(parameter),
        }
        Ok(())
    }

    pub fn get(&self, path: &str) -> Option<&ParameterValue> {
        self.parameter(path).map(|p| &p.value)
    }

    pub fn parameter(&self, path: &str) -> Option<&Parameter> {
        let (group, name) = split_path(path).ok()?;
        self.group(group)?.parameter(name)
    }

    pub fn group(&self, name: &str) -> Option<&ParameterGroup> {
        self.group_index.get(name).map(|idx| &self.groups[*idx])
    }

    pub fn groups(&self) -> &[ParameterGroup] {
        &self.groups
    }

    pub fn slot(&self, slot: ParameterSlot) -> &Parameter {
        &self.groups[slot.group].parameters[slot.index]
    }

    pub fn set_offset(&mut self, slot: ParameterSlot, offset: u64) {
        self.groups[slot.group].parameters[slot.index].offset_in_file = offset;
    }

    /// Forgets every recorded file offset, e.g. before writing a fresh file.
    pub fn reset_offsets(&mut self) {
        for group in &mut self.groups {
            for parameter in &mut group.parameters {
                parameter.offset_in_file = 0;
            }
        }
    }

    pub fn set_group_description(&mut self, group: &str, description: &str) -> Option<()> {
        let idx = *self.group_index.get(group)?;
        self.groups[idx].description = description.to_string();
        Some(())
    }

    /// Every parameter with its `GROUP:NAME` path, in directory order.
    pub fn iter(&self) -> impl Iterator<Item = (String, &Parameter)> {
        self.groups.iter().flat_map(|g| {
            g.parameters.iter().map(move |p| (format!("{}:{}", g.name, p.name), p))
        })
    }

    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.parameters.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_path_requires_two_segments() {
        assert_eq!(split_path("POINT:USED").unwrap(), ("POINT", "USED"));
        for bad in ["POINT", "POINT:", ":USED", "A:B:C", ""] {
            assert!(matches!(split_path(bad), Err(C3dError::InvalidPath(_))), "{bad}");
        }
    }

    #[test]
    fn groups_keep_creation_order() {
        let mut store = ParameterStore::new();
        store.set("POINT", "USED", 1i16.into(), true).unwrap();
        store.set("ANALOG", "USED", 0i16.into(), true).unwrap();
        store.set("POINT", "RATE", 30.0f32.into(), true).unwrap();

        let names: Vec<&str> = store.groups().iter().map(|g| g.name.as_str()).collect();
        assert_eq!(names, ["POINT", "ANALOG"]);
        assert_eq!(store.group("POINT").unwrap().parameters.len(), 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn closed_store_rejects_creation() {
        let mut store = ParameterStore::new();
        store.set("POINT", "USED", 1i16.into(), true).unwrap();

        assert!(matches!(
            store.set("INFO", "SCORE", 1i16.into(), false),
            Err(C3dError::Lifecycle(_))
        ));
        assert!(matches!(
            store.set("POINT", "SCORE", 1i16.into(), false),
            Err(C3dError::Lifecycle(_))
        ));
        assert!(matches!(
            store.set("POINT", "USED", 1.0f32.into(), false),
            Err(C3dError::ShapeMismatch { .. })
        ));
        store.set("POINT", "USED", 4i16.into(), false).unwrap();
        assert_eq!(store.get("POINT:USED"), Some(&ParameterValue::Int16(4)));
    }

    #[test]
    fn removing_a_group_reindexes_the_rest() {
        let mut store = ParameterStore::new();
        store.insert("POINT", "USED", 1i16.into());
        store.insert("EVENT", "USED", 2i16.into());
        store.insert("ANALOG", "USED", 0i16.into());

        assert_eq!(store.remove_group("EVENT").map(|g| g.parameters.len()), Some(1));
        assert!(store.remove_group("EVENT").is_none());
        assert!(store.get("EVENT:USED").is_none());
        assert_eq!(store.get("ANALOG:USED"), Some(&ParameterValue::Int16(0)));
        assert_eq!(store.group("ANALOG").unwrap().parameters[0].group_index, 1);
        assert_eq!(store.len(), 2);
    }
}
