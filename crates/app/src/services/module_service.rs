//! Module service: typed access to modules and outbound set commands.

use homelink_domain::error::{HomeLinkError, NotFoundError};
use homelink_domain::id::ModuleId;
use homelink_domain::module::{Module, TypedModule};

use crate::ports::{DeviceRepository, MessagePublisher, ModuleRepository};

/// Application service for reading and commanding device modules.
pub struct ModuleService<MR, DR, P> {
    modules: MR,
    devices: DR,
    publisher: P,
}

impl<MR, DR, P> ModuleService<MR, DR, P>
where
    MR: ModuleRepository,
    DR: DeviceRepository,
    P: MessagePublisher,
{
    /// Create a new service backed by the given repositories and publisher.
    pub fn new(modules: MR, devices: DR, publisher: P) -> Self {
        Self {
            modules,
            devices,
            publisher,
        }
    }

    async fn get_module(&self, id: ModuleId) -> Result<Module, HomeLinkError> {
        self.modules.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Module",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// Load a module and interpret its stored value.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::NotFound`] for an unknown id,
    /// [`HomeLinkError::UnknownModule`] or [`HomeLinkError::Coercion`] when
    /// the stored row cannot be typed.
    #[tracing::instrument(skip(self))]
    pub async fn get_typed(&self, id: ModuleId) -> Result<TypedModule, HomeLinkError> {
        self.get_module(id).await?.to_typed()
    }

    /// Command a module to take a new value.
    ///
    /// The value is coerced to the module's type, published on the module's
    /// channel and only then stored, so a rejected publish leaves the stored
    /// value unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`HomeLinkError::Coercion`] when `raw` does not fit the
    /// module's type, [`HomeLinkError::NotFound`] for an unknown module or
    /// device, or a transport or storage error.
    #[tracing::instrument(skip(self))]
    pub async fn set_value(&self, id: ModuleId, raw: &str) -> Result<TypedModule, HomeLinkError> {
        let module = self.get_module(id).await?;
        let typed = TypedModule::from_value(module.module_name()?, raw)?;

        let device = self
            .devices
            .get_by_id(&module.device_id)
            .await?
            .ok_or_else(|| NotFoundError {
                entity: "Device",
                id: module.device_id.to_string(),
            })?;
        let channel = device.channel(&module.name)?;
        let wire = typed.value().to_wire();

        tracing::debug!(topic = %channel, value = %wire, "publishing module value");
        self.publisher.publish(channel.to_string(), wire.clone()).await?;
        self.modules.update_value(id, &wire).await?;
        Ok(typed)
    }
}
