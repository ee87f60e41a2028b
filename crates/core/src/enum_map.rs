// Hearth is an open source community crowdfunding platform.
// Copyright (C) 2024 Hearth
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as
// published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

pub trait InsertEnumMapKey: Sized {
    fn into_usize(self) -> usize;
}

/// Map keyed by a small enum, backed by a dense vector of the enum's
/// discriminants.
#[derive(Clone, Debug)]
pub struct EnumMap<K: InsertEnumMapKey, V> {
    inner: Vec<Option<V>>,
    _phantom: std::marker::PhantomData<K>,
}

impl<K: InsertEnumMapKey, V> Default for EnumMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> EnumMap<K, V>
where
    K: InsertEnumMapKey,
{
    pub fn new() -> Self {
        Self {
            inner: vec![],
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn insert(&mut self, key: K, value: V) {
        let key = key.into_usize();

        if key >= self.inner.len() {
            self.inner.resize_with(key + 1, || None);
        }

        self.inner[key] = Some(value);
    }

    pub fn get(&self, key: K) -> Option<&V> {
        let key = key.into_usize();
        self.inner.get(key).and_then(|value| value.as_ref())
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.inner.iter().filter_map(|value| value.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Clone, Copy)]
    enum Key {
        A,
        B,
    }

    impl InsertEnumMapKey for Key {
        fn into_usize(self) -> usize {
            self as usize
        }
    }

    #[test]
    fn insert_and_get() {
        let mut map = EnumMap::new();

        map.insert(Key::B, 2);
        assert_eq!(map.get(Key::B), Some(&2));
        assert_eq!(map.get(Key::A), None);

        map.insert(Key::B, 3);
        assert_eq!(map.get(Key::B), Some(&3));
        assert_eq!(map.values().copied().collect::<Vec<_>>(), vec![3]);
    }
}
