use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::{BodyType, Error};

use super::{
    CustomSerializer, FormDataSerializer, JsonSerializer, Serializer, TextSerializer,
    UrlEncodedSerializer,
};

lazy_static::lazy_static! {
    static ref GLOBAL: Arc<SerializerRegistry> = Arc::new(SerializerRegistry::with_defaults());
}

/// Maps body-type tags to serializers.
///
/// Registering under an existing tag replaces the previous serializer.
/// Lookups of unregistered tags fail with [`Error::SerializerNotFound`].
///
/// Clients share one registry through an `Arc`; the process-wide instance
/// returned by [`SerializerRegistry::global`] is pre-populated with the
/// built-in strategies.
#[derive(Default)]
pub struct SerializerRegistry {
    serializers: RwLock<HashMap<BodyType, Arc<dyn Serializer>>>,
}

impl SerializerRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the five built-in serializers.
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(BodyType::JSON, JsonSerializer);
        registry.register(BodyType::FORM_DATA, FormDataSerializer::default());
        registry.register(BodyType::FORM_URLENCODED, UrlEncodedSerializer::default());
        registry.register(BodyType::TEXT, TextSerializer);
        registry.register(BodyType::CUSTOM, CustomSerializer);
        registry
    }

    /// The shared process-wide registry.
    pub fn global() -> Arc<SerializerRegistry> {
        Arc::clone(&GLOBAL)
    }

    pub fn register(&self, body_type: BodyType, serializer: impl Serializer + 'static) {
        self.register_arc(body_type, Arc::new(serializer));
    }

    pub fn register_arc(&self, body_type: BodyType, serializer: Arc<dyn Serializer>) {
        self.write().insert(body_type, serializer);
    }

    /// Look up the serializer for `body_type`.
    pub fn get(&self, body_type: &BodyType) -> Result<Arc<dyn Serializer>, Error> {
        self.read()
            .get(body_type)
            .cloned()
            .ok_or_else(|| Error::SerializerNotFound {
                body_type: body_type.clone(),
            })
    }

    pub fn has(&self, body_type: &BodyType) -> bool {
        self.read().contains_key(body_type)
    }

    /// Remove every registration.
    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<BodyType, Arc<dyn Serializer>>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.serializers.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<BodyType, Arc<dyn Serializer>>> {
        self.serializers.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl std::fmt::Debug for SerializerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags: Vec<String> = self.read().keys().map(|t| t.to_string()).collect();
        tags.sort();
        f.debug_struct("SerializerRegistry")
            .field("body_types", &tags)
            .finish()
    }
}
