//! An open-addressing hash table with linear probing and tombstone deletion.
//!
//! [`HashTable`] keeps every entry directly in a single slot array. A key's
//! home slot is `hash % capacity`; collisions walk forward one slot at a time,
//! wrapping at the end. Erasing an entry leaves a tombstone behind so lookups
//! keep probing past it, while inserts may reuse it.
//!
//! Tombstones count against the load factor until the next grow-triggered
//! rehash, which is the only point where they are reclaimed. This keeps probe
//! sequences bounded under heavy insert/erase churn.

use alloc::alloc::handle_alloc_error;
use alloc::boxed::Box;
use alloc::collections::TryReserveError;
use alloc::vec::Vec;
use core::alloc::Layout;
use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;
use core::ops::Index;

use crate::hasher::DefaultHashBuilder;

/// Slot count used by [`HashTable::new`] and `Default`.
const DEFAULT_CAPACITY: usize = 8;

/// Whether `consumed` slots out of `capacity` break the 2/3 load factor.
#[inline(always)]
fn exceeds_load_factor(consumed: usize, capacity: usize) -> bool {
    consumed as u128 * 3 > capacity as u128 * 2
}

#[inline(always)]
fn home_index(hash: u64, capacity: usize) -> usize {
    (hash % capacity as u64) as usize
}

#[inline(always)]
fn next_index(index: usize, capacity: usize) -> usize {
    if index + 1 == capacity { 0 } else { index + 1 }
}

#[derive(Clone, Debug)]
enum Slot<K, V> {
    /// Never used since the last clear or rehash. Ends an unsuccessful probe.
    Empty,
    Occupied {
        hash: u64,
        key: K,
        value: V,
    },
    /// Erased. Lookups probe past it, inserts may reuse it.
    Tombstone,
}

impl<K, V> Slot<K, V> {
    #[inline(always)]
    fn is_occupied(&self) -> bool {
        matches!(self, Slot::Occupied { .. })
    }

    #[inline(always)]
    fn entry(&self) -> Option<(&K, &V)> {
        match self {
            Slot::Occupied { key, value, .. } => Some((key, value)),
            _ => None,
        }
    }

    #[inline(always)]
    fn entry_mut(&mut self) -> Option<(&K, &mut V)> {
        match self {
            Slot::Occupied { key, value, .. } => Some((&*key, value)),
            _ => None,
        }
    }

    #[inline(always)]
    fn into_entry(self) -> Option<(K, V)> {
        match self {
            Slot::Occupied { key, value, .. } => Some((key, value)),
            _ => None,
        }
    }
}

fn try_allocate_slots<K, V>(capacity: usize) -> Result<Box<[Slot<K, V>]>, TryReserveError> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(capacity)?;
    slots.resize_with(capacity, || Slot::Empty);
    Ok(slots.into_boxed_slice())
}

#[cold]
#[inline(never)]
fn allocation_failure<K, V>(capacity: usize, error: TryReserveError) -> ! {
    match Layout::array::<Slot<K, V>>(capacity) {
        Ok(layout) => handle_alloc_error(layout),
        Err(_) => panic!("allocation size overflow: {error}"),
    }
}

/// First non-occupied slot on the probe path of `hash`.
///
/// Only used while rehashing into a fresh array, which always has room.
fn vacant_index<K, V>(slots: &[Slot<K, V>], hash: u64) -> usize {
    let capacity = slots.len();
    let mut index = home_index(hash, capacity);
    for _ in 0..capacity {
        if !slots[index].is_occupied() {
            return index;
        }
        index = next_index(index, capacity);
    }

    unreachable!("rehash target has no vacant slot")
}

/// An open-addressing hash table using linear probing and tombstones.
///
/// `HashTable<K, V, S>` maps keys of type `K` to values of type `V`, hashing
/// keys with the [`BuildHasher`] `S`. Every entry caches its 64-bit hash so
/// rehashing never calls back into `K: Hash`.
///
/// This is a low-level primitive rather than an insert-or-replace map:
/// [`insert`] requires the key to be absent, and [`at`], [`replace`] and
/// [`erase`] require it to be present. Violating either contract panics.
/// [`get`], [`get_mut`] and [`remove`] are the non-panicking lookups.
///
/// ## Load Factor
///
/// [`consumed`] counts occupied slots *plus* tombstones since the last
/// rehash. The table doubles its capacity and rehashes before an insert would
/// push `3 * consumed` above `2 * capacity`. Rehashing drops all tombstones.
/// Erasing never shrinks `consumed`; [`len`] tracks live entries separately.
///
/// ## Example
///
/// ```rust
/// use probe_hash::HashTable;
///
/// let mut table: HashTable<u64, &str> = HashTable::with_capacity(4);
/// table.insert(1, "a");
/// table.insert(5, "b");
///
/// assert_eq!(table.at(&1), &"a");
/// assert_eq!(table[&5], "b");
/// assert!(!table.contains(&9));
///
/// table.erase(&1);
/// assert_eq!(table.len(), 1);
/// assert_eq!(table.get(&1), None);
/// ```
///
/// [`insert`]: HashTable::insert
/// [`at`]: HashTable::at
/// [`replace`]: HashTable::replace
/// [`erase`]: HashTable::erase
/// [`get`]: HashTable::get
/// [`get_mut`]: HashTable::get_mut
/// [`remove`]: HashTable::remove
/// [`consumed`]: HashTable::consumed
/// [`len`]: HashTable::len
#[derive(Clone)]
pub struct HashTable<K, V, S = DefaultHashBuilder> {
    slots: Box<[Slot<K, V>]>,

    consumed: usize,
    populated: usize,

    hash_builder: S,
}

impl<K, V, S> Debug for HashTable<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HashTable")
            .field("slots", &self.slots)
            .field("capacity", &self.capacity())
            .field("consumed", &self.consumed)
            .field("populated", &self.populated)
            .finish()
    }
}

impl<K, V> HashTable<K, V, DefaultHashBuilder> {
    /// Creates an empty table with a small default capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    ///
    /// let table: HashTable<u32, String> = HashTable::new();
    /// assert!(table.is_empty());
    /// assert!(table.capacity() > 0);
    /// ```
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    /// Creates an empty table with exactly `capacity` slots.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Aborts through
    /// [`handle_alloc_error`] if the slot array cannot be allocated.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    ///
    /// let table: HashTable<u32, String> = HashTable::with_capacity(100);
    /// assert_eq!(table.capacity(), 100);
    /// ```
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<K, V, S> HashTable<K, V, S> {
    /// Creates an empty table with the default capacity and the given hasher
    /// builder.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_capacity_and_hasher(DEFAULT_CAPACITY, hash_builder)
    }

    /// Creates an empty table with exactly `capacity` slots and the given
    /// hasher builder.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Aborts through
    /// [`handle_alloc_error`] if the slot array cannot be allocated; use
    /// [`try_with_capacity_and_hasher`] to handle that case instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    /// use probe_hash::IdentityHashBuilder;
    ///
    /// let table: HashTable<u64, u64, _> =
    ///     HashTable::with_capacity_and_hasher(16, IdentityHashBuilder::default());
    /// assert_eq!(table.capacity(), 16);
    /// ```
    ///
    /// [`try_with_capacity_and_hasher`]: HashTable::try_with_capacity_and_hasher
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Self {
        assert!(capacity >= 1, "HashTable capacity must be at least 1");
        match Self::try_with_capacity_and_hasher(capacity, hash_builder) {
            Ok(table) => table,
            Err(error) => allocation_failure::<K, V>(capacity, error),
        }
    }

    /// Creates an empty table with exactly `capacity` slots, returning an
    /// error instead of aborting if the slot array cannot be allocated.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    /// use probe_hash::IdentityHashBuilder;
    ///
    /// let table = HashTable::<u64, u64, _>::try_with_capacity_and_hasher(
    ///     32,
    ///     IdentityHashBuilder::default(),
    /// )
    /// .unwrap();
    /// assert_eq!(table.capacity(), 32);
    ///
    /// let too_big = HashTable::<u64, u64, _>::try_with_capacity_and_hasher(
    ///     usize::MAX,
    ///     IdentityHashBuilder::default(),
    /// );
    /// assert!(too_big.is_err());
    /// ```
    pub fn try_with_capacity_and_hasher(
        capacity: usize,
        hash_builder: S,
    ) -> Result<Self, TryReserveError> {
        assert!(capacity >= 1, "HashTable capacity must be at least 1");
        Ok(Self {
            slots: try_allocate_slots(capacity)?,
            consumed: 0,
            populated: 0,
            hash_builder,
        })
    }

    /// Returns the number of live entries in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns `true` if the table holds no live entries.
    ///
    /// Tombstones left by [`erase`](HashTable::erase) do not count, so a table
    /// whose entries were all erased reports itself empty even before the
    /// next rehash.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    ///
    /// let mut table: HashTable<u64, u64> = HashTable::new();
    /// table.insert(1, 10);
    /// table.erase(&1);
    /// assert!(table.is_empty());
    /// assert_eq!(table.consumed(), 1);
    /// ```
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of usable slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of slots consumed since the last rehash or clear:
    /// live entries plus tombstones.
    ///
    /// This is the quantity the load factor is measured against. After any
    /// insert, `3 * consumed() <= 2 * capacity()` holds.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Returns a reference to the table's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Removes all entries, dropping every live key and value once.
    ///
    /// The capacity is kept. Every slot, tombstones included, becomes empty
    /// and [`consumed`](HashTable::consumed) resets to zero.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    ///
    /// let mut table: HashTable<u64, String> = HashTable::with_capacity(16);
    /// table.insert(1, "one".to_string());
    /// table.insert(2, "two".to_string());
    /// table.erase(&2);
    ///
    /// table.clear();
    /// assert!(table.is_empty());
    /// assert_eq!(table.consumed(), 0);
    /// assert_eq!(table.capacity(), 16);
    /// ```
    pub fn clear(&mut self) {
        if self.consumed == 0 {
            return;
        }

        for slot in self.slots.iter_mut() {
            *slot = Slot::Empty;
        }
        self.consumed = 0;
        self.populated = 0;
    }

    /// Grows the table to exactly `capacity` slots if that is larger than the
    /// current capacity, rehashing every live entry.
    ///
    /// Tombstones are dropped by the rehash, so afterwards
    /// [`consumed`](HashTable::consumed) equals [`len`](HashTable::len).
    /// Does nothing if `capacity` does not exceed the current capacity.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    ///
    /// let mut table: HashTable<u64, u64> = HashTable::with_capacity(4);
    /// table.insert(1, 1);
    /// table.insert(2, 2);
    /// table.erase(&2);
    /// assert_eq!(table.consumed(), 2);
    ///
    /// table.reserve(64);
    /// assert_eq!(table.capacity(), 64);
    /// assert_eq!(table.consumed(), 1);
    /// assert_eq!(table.at(&1), &1);
    ///
    /// table.reserve(8);
    /// assert_eq!(table.capacity(), 64);
    /// ```
    pub fn reserve(&mut self, capacity: usize) {
        if capacity > self.capacity() {
            self.rehash(capacity);
        }
    }

    /// Like [`reserve`](HashTable::reserve), but returns an error instead of
    /// aborting if the new slot array cannot be allocated. The table is left
    /// untouched on error.
    pub fn try_reserve(&mut self, capacity: usize) -> Result<(), TryReserveError> {
        if capacity > self.capacity() {
            self.try_rehash(capacity)?;
        }
        Ok(())
    }

    /// Returns a cursor at the first live entry in bucket order, or the end
    /// cursor if the table is empty.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    ///
    /// let mut table: HashTable<u64, &str> = HashTable::new();
    /// assert_eq!(table.begin(), table.end());
    ///
    /// table.insert(3, "three");
    /// let mut cursor = table.begin();
    /// assert_eq!(cursor.get(), Some((&3, &"three")));
    /// cursor.move_next();
    /// assert!(cursor.is_end());
    /// ```
    pub fn begin(&self) -> Cursor<'_, K, V, S> {
        Cursor {
            table: self,
            index: self.next_occupied(0),
        }
    }

    /// Returns the cursor one past the last slot.
    pub fn end(&self) -> Cursor<'_, K, V, S> {
        Cursor {
            table: self,
            index: self.capacity(),
        }
    }

    /// Returns an iterator over all entries in bucket order.
    ///
    /// The order is unspecified to callers and changes on rehash.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            slots: self.slots.iter(),
            remaining: self.populated,
        }
    }

    /// Returns an iterator over all entries with mutable references to the
    /// values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            slots: self.slots.iter_mut(),
            remaining: self.populated,
        }
    }

    /// Returns an iterator over the keys of the table.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the table.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    fn next_occupied(&self, from: usize) -> usize {
        self.slots[from..]
            .iter()
            .position(Slot::is_occupied)
            .map_or(self.capacity(), |offset| from + offset)
    }

    #[cold]
    fn rehash(&mut self, capacity: usize) {
        if let Err(error) = self.try_rehash(capacity) {
            allocation_failure::<K, V>(capacity, error);
        }
    }

    fn try_rehash(&mut self, capacity: usize) -> Result<(), TryReserveError> {
        debug_assert!(capacity > self.capacity());

        let slots = try_allocate_slots(capacity)?;
        let old_slots = core::mem::replace(&mut self.slots, slots);

        // Cached hashes are reused; only occupied slots move, tombstones are
        // dropped along with the old array.
        for slot in old_slots.into_vec() {
            if let Slot::Occupied { hash, key, value } = slot {
                let index = vacant_index(&self.slots, hash);
                self.slots[index] = Slot::Occupied { hash, key, value };
            }
        }
        self.consumed = self.populated;

        Ok(())
    }

    /// Whether writing a new entry at `index` would break the load factor.
    ///
    /// Only claiming an empty slot consumes one; a reused tombstone was
    /// already counted.
    #[inline]
    fn claim_needs_growth(&self, index: usize) -> bool {
        matches!(self.slots[index], Slot::Empty)
            && exceeds_load_factor(self.consumed + 1, self.capacity())
    }

    /// Writes a new entry into a vacant slot found by `claim_index`.
    fn occupy(&mut self, index: usize, hash: u64, key: K, value: V) -> &mut V {
        let slot = &mut self.slots[index];
        debug_assert!(!slot.is_occupied());

        // A reused tombstone was already counted.
        if matches!(slot, Slot::Empty) {
            self.consumed += 1;
        }
        self.populated += 1;

        *slot = Slot::Occupied { hash, key, value };
        match slot {
            Slot::Occupied { value, .. } => value,
            _ => unreachable!(),
        }
    }
}

impl<K, V, S> HashTable<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Inserts a new entry. The key must not already be present.
    ///
    /// The entry takes the first empty or tombstoned slot on its probe path.
    /// Reusing a tombstone never grows the table. Claiming an empty slot that
    /// would push the load factor above 2/3 (tombstones included) first
    /// doubles the capacity and rehashes, then probes again.
    ///
    /// # Panics
    ///
    /// Panics if the key is already present. Aborts through
    /// [`handle_alloc_error`] if growing fails; use
    /// [`try_insert`](HashTable::try_insert) to handle that case instead.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    ///
    /// let mut table: HashTable<String, u32> = HashTable::new();
    /// table.insert("answer".to_string(), 42);
    /// assert_eq!(table.at("answer"), &42);
    /// ```
    pub fn insert(&mut self, key: K, value: V) {
        let hash = self.hash_builder.hash_one(&key);
        let index = self.claim_for_insert(hash, &key);
        self.occupy(index, hash, key, value);
    }

    /// Like [`insert`](HashTable::insert), but returns an error instead of
    /// aborting if the table needs to grow and the allocation fails.
    ///
    /// On error the key and value are dropped and the table is unchanged.
    ///
    /// # Panics
    ///
    /// Panics if the key is already present.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<(), TryReserveError> {
        let hash = self.hash_builder.hash_one(&key);
        let index = self.try_claim_for_insert(hash, &key)?;
        self.occupy(index, hash, key, value);
        Ok(())
    }

    /// Inserts a new key and constructs its value in place from `make`,
    /// returning a mutable reference to the stored value.
    ///
    /// The slot is chosen exactly as [`insert`](HashTable::insert) chooses it.
    /// If `make` panics the table is left without the entry.
    ///
    /// # Panics
    ///
    /// Panics if the key is already present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    ///
    /// let mut table: HashTable<u64, Vec<u64>> = HashTable::new();
    /// let values = table.emplace_with(7, |key| vec![*key; 3]);
    /// values.push(8);
    /// assert_eq!(table.at(&7), &vec![7, 7, 7, 8]);
    /// ```
    pub fn emplace_with(&mut self, key: K, make: impl FnOnce(&K) -> V) -> &mut V {
        let hash = self.hash_builder.hash_one(&key);
        let index = self.claim_for_insert(hash, &key);
        let value = make(&key);
        self.occupy(index, hash, key, value)
    }

    /// Inserts a new key with a default value and returns a mutable reference
    /// to it for the caller to fill in.
    ///
    /// # Panics
    ///
    /// Panics if the key is already present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    ///
    /// let mut table: HashTable<&str, u32> = HashTable::new();
    /// *table.emplace("hits") += 3;
    /// assert_eq!(table.at("hits"), &3);
    /// ```
    pub fn emplace(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.emplace_with(key, |_| V::default())
    }

    /// Overwrites the value of an existing key, dropping the old value.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    ///
    /// let mut table: HashTable<u64, &str> = HashTable::new();
    /// table.insert(1, "a");
    /// table.replace(&1, "z");
    /// assert_eq!(table.at(&1), &"z");
    /// ```
    pub fn replace<Q>(&mut self, key: &Q, value: V)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.get_mut(key) {
            Some(slot_value) => *slot_value = value,
            None => panic!("HashTable::replace: key is not present"),
        }
    }

    /// Returns a reference to the value of an existing key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present. Use [`get`](HashTable::get) when the
    /// key may be missing.
    pub fn at<Q>(&self, key: &Q) -> &V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.get(key) {
            Some(value) => value,
            None => panic!("HashTable::at: key is not present"),
        }
    }

    /// Returns a mutable reference to the value of an existing key.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present.
    pub fn at_mut<Q>(&mut self, key: &Q) -> &mut V
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.get_mut(key) {
            Some(value) => value,
            None => panic!("HashTable::at_mut: key is not present"),
        }
    }

    /// Returns a reference to the value of `key`, or `None` if it is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    ///
    /// let mut table: HashTable<String, u32> = HashTable::new();
    /// table.insert("one".to_string(), 1);
    /// assert_eq!(table.get("one"), Some(&1));
    /// assert_eq!(table.get("two"), None);
    /// ```
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        self.slots[index].entry().map(|(_, value)| value)
    }

    /// Returns a mutable reference to the value of `key`, or `None` if it is
    /// absent.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        self.slots[index].entry_mut().map(|(_, value)| value)
    }

    /// Returns a cursor at the entry for `key`, or the end cursor if the key
    /// is absent.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    ///
    /// let mut table: HashTable<u64, &str> = HashTable::new();
    /// table.insert(4, "four");
    ///
    /// assert_eq!(table.find(&4).value(), Some(&"four"));
    /// assert_eq!(table.find(&5), table.end());
    /// ```
    pub fn find<Q>(&self, key: &Q) -> Cursor<'_, K, V, S>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        Cursor {
            table: self,
            index: self.find_index(key).unwrap_or(self.capacity()),
        }
    }

    /// Returns `true` if the table holds an entry for `key`.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find_index(key).is_some()
    }

    /// Erases an existing key, dropping its key and value and leaving a
    /// tombstone in its slot.
    ///
    /// [`consumed`](HashTable::consumed) is not decremented; the tombstone
    /// keeps counting against the load factor until the next rehash.
    ///
    /// # Panics
    ///
    /// Panics if the key is not present. Use [`remove`](HashTable::remove)
    /// when the key may be missing.
    pub fn erase<Q>(&mut self, key: &Q)
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.remove_entry(key).is_none() {
            panic!("HashTable::erase: key is not present");
        }
    }

    /// Removes `key` and returns its value, or `None` if it is absent.
    ///
    /// Leaves a tombstone exactly like [`erase`](HashTable::erase).
    ///
    /// # Examples
    ///
    /// ```rust
    /// use probe_hash::HashTable;
    ///
    /// let mut table: HashTable<u64, u64> = HashTable::new();
    /// table.insert(42, 420);
    /// assert_eq!(table.remove(&42), Some(420));
    /// assert_eq!(table.remove(&42), None);
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, value)| value)
    }

    /// Removes `key` and returns the stored key and value, or `None` if it is
    /// absent.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let index = self.find_index(key)?;
        let entry = core::mem::replace(&mut self.slots[index], Slot::Tombstone).into_entry();
        debug_assert!(entry.is_some());
        self.populated -= 1;
        entry
    }

    /// Probes for `key`, stopping at the first empty slot.
    ///
    /// Inserts always take the first non-occupied slot on their path, so an
    /// empty slot proves the key was never placed beyond it. Tombstones do not
    /// stop the probe.
    fn find_index<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_builder.hash_one(key);
        let capacity = self.capacity();
        let mut index = home_index(hash, capacity);
        for _ in 0..capacity {
            match &self.slots[index] {
                Slot::Empty => return None,
                Slot::Occupied {
                    hash: slot_hash,
                    key: slot_key,
                    ..
                } if *slot_hash == hash && slot_key.borrow() == key => return Some(index),
                _ => {}
            }
            index = next_index(index, capacity);
        }

        None
    }

    /// Finds the slot for a new entry, growing until claiming it keeps the
    /// load factor bound.
    fn claim_for_insert(&mut self, hash: u64, key: &K) -> usize {
        let mut index = self.claim_index(hash, key);
        while self.claim_needs_growth(index) {
            self.rehash(self.capacity().saturating_mul(2));
            index = self.claim_index(hash, key);
        }
        index
    }

    fn try_claim_for_insert(&mut self, hash: u64, key: &K) -> Result<usize, TryReserveError> {
        let mut index = self.claim_index(hash, key);
        while self.claim_needs_growth(index) {
            self.try_rehash(self.capacity().saturating_mul(2))?;
            index = self.claim_index(hash, key);
        }
        Ok(index)
    }

    /// Picks the slot a new entry for `key` goes into: the first empty or
    /// tombstoned slot on its probe path.
    ///
    /// The probe carries on to the first empty slot so a duplicate key past a
    /// reusable tombstone is still caught.
    fn claim_index(&self, hash: u64, key: &K) -> usize {
        let capacity = self.capacity();
        let mut index = home_index(hash, capacity);
        let mut reusable = None;
        for _ in 0..capacity {
            match &self.slots[index] {
                Slot::Empty => return reusable.unwrap_or(index),
                Slot::Tombstone => {
                    reusable.get_or_insert(index);
                }
                Slot::Occupied {
                    hash: slot_hash,
                    key: slot_key,
                    ..
                } => {
                    if *slot_hash == hash && slot_key == key {
                        panic!("HashTable::insert: key is already present");
                    }
                }
            }
            index = next_index(index, capacity);
        }

        match reusable {
            Some(index) => index,
            None => unreachable!("load factor bound guarantees a vacant slot"),
        }
    }
}

#[cfg(feature = "stats")]
impl<K, V, S> HashTable<K, V, S> {
    /// Computes how far every live entry sits from its home slot.
    ///
    /// Bin `n` of the result counts entries found `n` slots past their home
    /// slot, wrapping included.
    pub fn probe_histogram(&self) -> crate::stats::ProbeHistogram {
        let capacity = self.capacity();
        let mut bins = alloc::vec![0usize; 1];
        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Occupied { hash, .. } = slot {
                let home = home_index(*hash, capacity);
                let distance = (index + capacity - home) % capacity;
                if distance >= bins.len() {
                    bins.resize(distance + 1, 0);
                }
                bins[distance] += 1;
            }
        }

        crate::stats::ProbeHistogram::new(bins)
    }

    /// Returns slot usage and memory statistics for the table.
    pub fn debug_stats(&self) -> crate::stats::DebugStats {
        let tombstones = self
            .slots
            .iter()
            .filter(|slot| matches!(slot, Slot::Tombstone))
            .count();
        let histogram = self.probe_histogram();
        let capacity = self.capacity();

        crate::stats::DebugStats {
            populated: self.populated,
            consumed: self.consumed,
            tombstones,
            capacity,
            load_factor: self.consumed as f64 / capacity as f64,
            occupancy: self.populated as f64 / capacity as f64,
            max_probe_length: histogram.max_probe_length(),
            mean_probe_length: histogram.mean_probe_length(),
            total_bytes: capacity * core::mem::size_of::<Slot<K, V>>(),
            wasted_bytes: (capacity - self.populated) * core::mem::size_of::<Slot<K, V>>(),
        }
    }
}

impl<K, V, S> Default for HashTable<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

/// Tables are equal when they hold the same live keys mapped to equal values.
///
/// Capacity, bucket placement and tombstones are ignored.
impl<K, V, S> PartialEq for HashTable<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }

        self.iter()
            .all(|(key, value)| other.get(key).is_some_and(|other| value == other))
    }
}

impl<K, V, S> Eq for HashTable<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, Q, V, S> Index<&Q> for HashTable<K, V, S>
where
    K: Borrow<Q> + Hash + Eq,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    /// Same as [`HashTable::at`].
    fn index(&self, key: &Q) -> &V {
        self.at(key)
    }
}

/// A position in a [`HashTable`]: either a live entry or the end.
///
/// Produced by [`HashTable::begin`], [`HashTable::end`] and
/// [`HashTable::find`]. A cursor borrows its table, so any mutation of the
/// table (which may rehash and move every entry) ends the cursor's life.
///
/// Two cursors are equal when they point at the same slot of the same table.
///
/// # Examples
///
/// ```rust
/// use probe_hash::HashTable;
///
/// let mut table: HashTable<u64, u64> = HashTable::new();
/// for key in 0..4 {
///     table.insert(key, key * 10);
/// }
///
/// let mut sum = 0;
/// let mut cursor = table.begin();
/// while cursor != table.end() {
///     sum += cursor.value().unwrap();
///     cursor.move_next();
/// }
/// assert_eq!(sum, 60);
/// ```
pub struct Cursor<'a, K, V, S = DefaultHashBuilder> {
    table: &'a HashTable<K, V, S>,
    index: usize,
}

impl<'a, K, V, S> Cursor<'a, K, V, S> {
    /// Returns `true` if this is the end cursor.
    pub fn is_end(&self) -> bool {
        self.index == self.table.capacity()
    }

    /// Returns the key and value at the cursor, or `None` at the end.
    pub fn get(&self) -> Option<(&'a K, &'a V)> {
        let table = self.table;
        table.slots.get(self.index).and_then(Slot::entry)
    }

    /// Returns the key at the cursor, or `None` at the end.
    pub fn key(&self) -> Option<&'a K> {
        self.get().map(|(key, _)| key)
    }

    /// Returns the value at the cursor, or `None` at the end.
    pub fn value(&self) -> Option<&'a V> {
        self.get().map(|(_, value)| value)
    }

    /// Advances to the next live entry in bucket order, or to the end.
    ///
    /// # Panics
    ///
    /// Panics if the cursor is already at the end.
    pub fn move_next(&mut self) {
        assert!(!self.is_end(), "Cursor::move_next called on the end cursor");
        self.index = self.table.next_occupied(self.index + 1);
    }
}

impl<K, V, S> Clone for Cursor<'_, K, V, S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<K, V, S> Copy for Cursor<'_, K, V, S> {}

impl<K, V, S> PartialEq for Cursor<'_, K, V, S> {
    fn eq(&self, other: &Self) -> bool {
        core::ptr::eq(self.table, other.table) && self.index == other.index
    }
}

impl<K, V, S> Eq for Cursor<'_, K, V, S> {}

impl<K, V, S> Debug for Cursor<'_, K, V, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Cursor")
            .field("index", &self.index)
            .field("is_end", &self.is_end())
            .finish()
    }
}

/// An iterator over the entries of a [`HashTable`] in bucket order.
///
/// Created by [`HashTable::iter`].
pub struct Iter<'a, K, V> {
    slots: core::slice::Iter<'a, Slot<K, V>>,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            slots: self.slots.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let entry = self.slots.find_map(Slot::entry);
        if entry.is_some() {
            self.remaining -= 1;
        }
        entry
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// A mutable iterator over the entries of a [`HashTable`] in bucket order.
///
/// Created by [`HashTable::iter_mut`].
pub struct IterMut<'a, K, V> {
    slots: core::slice::IterMut<'a, Slot<K, V>>,
    remaining: usize,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let entry = self.slots.find_map(Slot::entry_mut);
        if entry.is_some() {
            self.remaining -= 1;
        }
        entry
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a [`HashTable`].
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

impl<K, V> FusedIterator for Keys<'_, K, V> {}

impl<K, V> Clone for Keys<'_, K, V> {
    fn clone(&self) -> Self {
        Keys {
            inner: self.inner.clone(),
        }
    }
}

/// An iterator over the values of a [`HashTable`].
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

impl<K, V> FusedIterator for Values<'_, K, V> {}

impl<K, V> Clone for Values<'_, K, V> {
    fn clone(&self) -> Self {
        Values {
            inner: self.inner.clone(),
        }
    }
}

/// A consuming iterator over the entries of a [`HashTable`].
pub struct IntoIter<K, V> {
    slots: alloc::vec::IntoIter<Slot<K, V>>,
    remaining: usize,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let entry = self.slots.find_map(Slot::into_entry);
        if entry.is_some() {
            self.remaining -= 1;
        }
        entry
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

impl<K, V, S> IntoIterator for HashTable<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            remaining: self.populated,
            slots: self.slots.into_vec().into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashTable<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashTable<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::rc::Rc;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use core::cell::Cell;
    use core::hash::BuildHasher;

    use rand::Rng;
    use rand::SeedableRng;
    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use rand::rngs::SmallRng;
    use siphasher::sip::SipHasher;

    use super::*;
    use crate::hasher::IdentityHashBuilder;

    #[derive(Clone)]
    struct SipHashBuilder {
        k0: u64,
        k1: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k0, self.k1)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k0: rng.try_next_u64().unwrap_or(0),
                k1: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    fn identity_table<V>(capacity: usize) -> HashTable<u64, V, IdentityHashBuilder> {
        HashTable::with_capacity_and_hasher(capacity, IdentityHashBuilder::default())
    }

    /// Value that counts how many times it has been dropped.
    struct Tracked {
        drops: Rc<Cell<usize>>,
    }

    impl Drop for Tracked {
        fn drop(&mut self) {
            self.drops.set(self.drops.get() + 1);
        }
    }

    fn tracked(drops: &Rc<Cell<usize>>) -> Tracked {
        Tracked {
            drops: drops.clone(),
        }
    }

    #[test]
    fn insert_and_at() {
        let mut table: HashTable<u64, i32, SipHashBuilder> =
            HashTable::with_capacity_and_hasher(1, SipHashBuilder::default());
        for k in 0..64u64 {
            table.insert(k, (k as i32) * 2);
            assert_eq!(table.at(&k), &((k as i32) * 2), "{:#?}", table);
        }

        assert_eq!(table.len(), 64);
        for k in 0..64u64 {
            assert_eq!(table.get(&k), Some(&((k as i32) * 2)));
        }
        assert!(table.get(&999).is_none());
    }

    #[test]
    fn colliding_keys_probe_linearly() {
        let mut table = identity_table(4);
        table.insert(1, "a");
        table.insert(5, "b");

        assert_eq!(table.capacity(), 4);
        assert!(matches!(table.slots[1], Slot::Occupied { key: 1, .. }));
        assert!(matches!(table.slots[2], Slot::Occupied { key: 5, .. }));
        assert_eq!(table.at(&1), &"a");
        assert_eq!(table.at(&5), &"b");
        assert!(!table.contains(&9));
    }

    #[test]
    fn probe_wraps_around_the_end() {
        let mut table = identity_table(8);
        table.insert(7, "seven");
        table.insert(15, "fifteen");

        assert!(matches!(table.slots[7], Slot::Occupied { key: 7, .. }));
        assert!(matches!(table.slots[0], Slot::Occupied { key: 15, .. }));
        assert_eq!(table.at(&15), &"fifteen");
        assert!(!table.contains(&23));
    }

    #[test]
    fn erase_leaves_tombstone_and_keeps_consumed() {
        let mut table = identity_table(8);
        table.insert(1, 10);
        table.insert(9, 90);
        table.erase(&1);

        assert!(matches!(table.slots[1], Slot::Tombstone));
        assert_eq!(table.len(), 1);
        assert_eq!(table.consumed(), 2);

        // Lookups must probe past the tombstone.
        assert_eq!(table.at(&9), &90);
        assert!(!table.contains(&1));
    }

    #[test]
    fn insert_reuses_first_tombstone() {
        let mut table = identity_table(8);
        table.insert(1, 10);
        table.insert(9, 90);
        table.erase(&1);
        table.insert(17, 170);

        assert!(matches!(table.slots[1], Slot::Occupied { key: 17, .. }));
        assert_eq!(table.consumed(), 2);
        assert_eq!(table.len(), 2);
        assert_eq!(table.capacity(), 8);
    }

    #[test]
    fn tombstone_reuse_at_threshold_does_not_grow() {
        let mut table = identity_table(6);
        for k in 0..4 {
            table.insert(k, k);
        }
        table.erase(&0);
        assert_eq!(table.consumed(), 4);

        // 6 has home slot 0, which holds the tombstone.
        table.insert(6, 6);
        assert_eq!(table.capacity(), 6);
        assert_eq!(table.consumed(), 4);
        assert!(matches!(table.slots[0], Slot::Occupied { key: 6, .. }));

        table.erase(&6);
        table.try_insert(12, 12).unwrap();
        assert_eq!(table.capacity(), 6);
        assert_eq!(table.consumed(), 4);

        table.erase(&12);
        *table.emplace_with(18, |k| *k) += 1;
        assert_eq!(table.capacity(), 6);
        assert_eq!(table.at(&18), &19);

        // 5 lands on an empty slot, so it still has to grow.
        table.insert(5, 5);
        assert_eq!(table.capacity(), 12);
        assert_eq!(table.consumed(), 5);
    }

    #[test]
    #[should_panic(expected = "already present")]
    fn duplicate_insert_panics() {
        let mut table = identity_table(8);
        table.insert(3, 1);
        table.insert(3, 2);
    }

    #[test]
    #[should_panic(expected = "already present")]
    fn duplicate_behind_tombstone_panics() {
        let mut table = identity_table(8);
        table.insert(1, 1);
        table.insert(9, 9);
        table.erase(&1);
        table.insert(9, 10);
    }

    #[test]
    #[should_panic(expected = "capacity must be at least 1")]
    fn zero_capacity_panics() {
        let _ = identity_table::<u8>(0);
    }

    #[test]
    #[should_panic(expected = "HashTable::at")]
    fn at_missing_key_panics() {
        let table = identity_table::<u8>(8);
        table.at(&1);
    }

    #[test]
    #[should_panic(expected = "HashTable::replace")]
    fn replace_missing_key_panics() {
        let mut table = identity_table(8);
        table.insert(2, 2);
        table.replace(&1, 3);
    }

    #[test]
    #[should_panic(expected = "HashTable::erase")]
    fn erase_missing_key_panics() {
        let mut table = identity_table(8);
        table.insert(2, 2);
        table.erase(&2);
        table.erase(&2);
    }

    #[test]
    fn grows_before_exceeding_two_thirds() {
        let mut table = identity_table(3);
        table.insert(0, 0);
        table.insert(1, 1);
        assert_eq!(table.capacity(), 3);

        table.insert(2, 2);
        assert_eq!(table.capacity(), 6);
        assert_eq!(table.consumed(), 3);
        for k in 0..3 {
            assert_eq!(table.at(&k), &k);
        }
    }

    #[test]
    fn growth_rehash_drops_tombstones() {
        let mut table = identity_table(6);
        for k in 0..4 {
            table.insert(k, k);
        }
        table.erase(&0);
        table.erase(&1);
        table.erase(&2);
        assert_eq!(table.consumed(), 4);

        table.insert(10, 10);
        assert_eq!(table.capacity(), 12);
        assert_eq!(table.len(), 2);
        assert_eq!(table.consumed(), 2);
        assert!(!table.slots.iter().any(|slot| matches!(slot, Slot::Tombstone)));
        assert_eq!(table.at(&3), &3);
        assert_eq!(table.at(&10), &10);
    }

    #[test]
    fn begin_equals_end_when_empty() {
        let mut table = identity_table::<u8>(8);
        assert_eq!(table.begin(), table.end());
        assert!(table.begin().is_end());

        table.insert(4, 4);
        table.erase(&4);
        assert_eq!(table.begin(), table.end());
    }

    #[test]
    fn cursor_walks_bucket_order() {
        let mut table = identity_table(8);
        for k in [6u64, 2, 4] {
            table.insert(k, k * 100);
        }
        table.erase(&4);

        let mut seen = Vec::new();
        let mut cursor = table.begin();
        while !cursor.is_end() {
            seen.push(*cursor.key().unwrap());
            cursor.move_next();
        }
        assert_eq!(seen, vec![2, 6]);
        assert_eq!(cursor, table.end());
        assert_eq!(cursor.get(), None);
    }

    #[test]
    fn find_returns_matching_cursor() {
        let mut table = identity_table(8);
        table.insert(3, "three");
        table.insert(11, "eleven");

        let cursor = table.find(&11);
        assert_eq!(cursor.get(), Some((&11, &"eleven")));
        assert_eq!(cursor, table.find(&11));
        assert_ne!(cursor, table.find(&3));
        assert_eq!(table.find(&19), table.end());
    }

    #[test]
    #[should_panic(expected = "end cursor")]
    fn move_next_past_end_panics() {
        let table = identity_table::<u8>(8);
        let mut cursor = table.end();
        cursor.move_next();
    }

    #[test]
    fn each_value_dropped_exactly_once() {
        let drops = Rc::new(Cell::new(0));
        {
            let mut table = identity_table(4);
            for k in 0..10 {
                table.insert(k, tracked(&drops));
            }
            assert_eq!(drops.get(), 0, "growth must move, not drop");

            table.erase(&0);
            assert_eq!(drops.get(), 1);

            table.replace(&1, tracked(&drops));
            assert_eq!(drops.get(), 2);

            let removed = table.remove(&2);
            assert_eq!(drops.get(), 2);
            drop(removed);
            assert_eq!(drops.get(), 3);

            // Eight live entries remain, including the replacement for key 1.
            table.clear();
            assert_eq!(drops.get(), 11);

            for k in 0..3 {
                table.insert(k, tracked(&drops));
            }
        }
        assert_eq!(drops.get(), 14);
    }

    #[test]
    fn clear_resets_every_slot() {
        let mut table = identity_table(8);
        table.insert(1, 1);
        table.insert(2, 2);
        table.erase(&1);
        table.clear();

        assert!(table.is_empty());
        assert_eq!(table.consumed(), 0);
        assert_eq!(table.capacity(), 8);
        assert!(table.slots.iter().all(|slot| matches!(slot, Slot::Empty)));

        table.insert(1, 5);
        assert_eq!(table.at(&1), &5);
    }

    #[test]
    fn reserve_only_grows() {
        let mut table = identity_table(8);
        table.insert(5, 5);
        table.reserve(4);
        assert_eq!(table.capacity(), 8);

        table.reserve(100);
        assert_eq!(table.capacity(), 100);
        assert_eq!(table.at(&5), &5);
    }

    #[test]
    fn try_reserve_reports_overflow() {
        let mut table = identity_table(8);
        table.insert(1, 1);
        assert!(table.try_reserve(usize::MAX).is_err());
        assert_eq!(table.capacity(), 8);
        assert_eq!(table.at(&1), &1);
        assert!(table.try_reserve(64).is_ok());
        assert_eq!(table.capacity(), 64);
    }

    #[test]
    fn emplace_constructs_in_place() {
        let mut table = identity_table::<Vec<u64>>(2);
        table.emplace(1).push(10);
        table.emplace_with(2, |k| vec![*k]).push(20);

        assert_eq!(table.at(&1), &vec![10]);
        assert_eq!(table.at(&2), &vec![2, 20]);
    }

    #[test]
    fn string_keys_borrowed_lookup() {
        let mut table: HashTable<String, i32, SipHashBuilder> =
            HashTable::with_hasher(SipHashBuilder::default());
        let keys = ["hello", "world", "foo", "bar", "baz"];
        for (i, k) in keys.iter().enumerate() {
            table.insert(k.to_string(), i as i32);
        }

        for (i, k) in keys.iter().enumerate() {
            assert_eq!(table.at(*k), &(i as i32));
        }
        table.erase("foo");
        assert!(!table.contains("foo"));
        assert_eq!(table.remove("bar"), Some(3));
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn iterators_visit_live_entries() {
        let mut table = identity_table(16);
        for k in 0..10u64 {
            table.insert(k, k + 1);
        }
        for k in (0..10u64).step_by(3) {
            table.erase(&k);
        }

        let mut keys: Vec<u64> = table.keys().copied().collect();
        keys.sort();
        assert_eq!(keys, vec![1, 2, 4, 5, 7, 8]);
        assert_eq!(table.iter().len(), 6);
        assert_eq!(table.values().sum::<u64>(), 2 + 3 + 5 + 6 + 8 + 9);

        for (_, value) in table.iter_mut() {
            *value *= 10;
        }
        assert_eq!(table.at(&8), &90);

        let mut owned: Vec<(u64, u64)> = table.into_iter().collect();
        owned.sort();
        assert_eq!(owned[0], (1, 20));
        assert_eq!(owned.len(), 6);
    }

    #[test]
    fn keys_and_values_clone_and_fuse() {
        let mut table = identity_table(8);
        table.insert(1, 10);
        table.insert(2, 20);

        let mut keys = table.keys();
        assert_eq!(keys.next(), Some(&1));
        let rest: Vec<u64> = keys.clone().copied().collect();
        assert_eq!(rest, vec![2]);
        assert_eq!(keys.next(), Some(&2));
        assert_eq!(keys.next(), None);
        assert_eq!(keys.next(), None);

        let mut values = table.values();
        let all: Vec<u64> = values.clone().copied().collect();
        assert_eq!(all, vec![10, 20]);
        assert_eq!(values.len(), 2);
        values.by_ref().for_each(drop);
        assert_eq!(values.next(), None);
    }

    #[test]
    fn equality_ignores_tombstones_and_capacity() {
        let mut a = identity_table(4);
        a.insert(1, "x");
        a.insert(2, "y");

        let mut b = identity_table(16);
        b.insert(2, "y");
        b.insert(3, "z");
        b.erase(&3);
        b.insert(1, "x");

        assert_eq!(a, b);

        b.replace(&1, "w");
        assert_ne!(a, b);

        b.replace(&1, "x");
        b.insert(4, "extra");
        assert_ne!(a, b);
    }

    #[test]
    fn clone_is_independent() {
        let mut original = identity_table(8);
        original.insert(1, "one".to_string());
        original.insert(2, "two".to_string());

        let cloned = original.clone();
        original.replace(&1, "uno".to_string());

        assert_eq!(cloned.at(&1), "one");
        assert_eq!(original.at(&1), "uno");
        assert_eq!(cloned.len(), 2);
    }

    #[test]
    fn debug_dump_lists_every_slot() {
        let mut table = identity_table(4);
        table.insert(1, 'a');
        table.insert(2, 'b');
        table.erase(&2);

        let dump = format!("{:?}", table);
        assert!(dump.starts_with("HashTable"));
        assert_eq!(dump.matches("Empty").count(), 2);
        assert_eq!(dump.matches("Tombstone").count(), 1);
        assert!(dump.contains("Occupied { hash: 1, key: 1, value: 'a' }"));
        assert!(dump.contains("consumed: 2"));
        assert!(dump.contains("populated: 1"));
    }

    #[test]
    #[cfg(feature = "std")]
    #[cfg_attr(miri, ignore)]
    fn random_churn_keeps_invariants() {
        let mut rng = SmallRng::seed_from_u64(0x5eed);
        let mut table: HashTable<u64, u64, SipHashBuilder> =
            HashTable::with_capacity_and_hasher(8, SipHashBuilder::default());
        let mut model = std::collections::HashMap::new();

        for _ in 0..20_000 {
            let key = rng.random_range(0..512u64);
            if model.contains_key(&key) {
                if rng.random_bool(0.5) {
                    table.erase(&key);
                    model.remove(&key);
                } else {
                    let value = rng.random::<u64>();
                    table.replace(&key, value);
                    model.insert(key, value);
                }
            } else {
                let value = rng.random::<u64>();
                table.insert(key, value);
                model.insert(key, value);
            }

            assert!(3 * table.consumed() <= 2 * table.capacity());
            assert_eq!(table.len(), model.len());
        }

        for key in 0..512u64 {
            assert_eq!(table.get(&key), model.get(&key));
        }
    }
}
