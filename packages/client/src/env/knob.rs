//! Names of the knobs that process-wide overrides can set

use std::fmt;

/// Every environment knob that accepts a process-wide override.
///
/// Delays, the retry strategy and the shared resources are only
/// configurable through the builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Knob {
    DcpEnabled,
    SslEnabled,
    SslKeystoreFile,
    SslKeystorePassword,
    QueryEnabled,
    QueryPort,
    BootstrapHttpEnabled,
    BootstrapCarrierEnabled,
    BootstrapHttpDirectPort,
    BootstrapHttpSslPort,
    BootstrapCarrierDirectPort,
    BootstrapCarrierSslPort,
    IoPoolSize,
    ComputationPoolSize,
    RequestBufferSize,
    ResponseBufferSize,
    KvEndpoints,
    ViewEndpoints,
    QueryEndpoints,
    PackageNameAndVersion,
    UserAgent,
    MaxRequestLifetime,
    KeepAliveInterval,
    AutoreleaseAfter,
}

impl Knob {
    pub const ALL: [Knob; 24] = [
        Knob::DcpEnabled,
        Knob::SslEnabled,
        Knob::SslKeystoreFile,
        Knob::SslKeystorePassword,
        Knob::QueryEnabled,
        Knob::QueryPort,
        Knob::BootstrapHttpEnabled,
        Knob::BootstrapCarrierEnabled,
        Knob::BootstrapHttpDirectPort,
        Knob::BootstrapHttpSslPort,
        Knob::BootstrapCarrierDirectPort,
        Knob::BootstrapCarrierSslPort,
        Knob::IoPoolSize,
        Knob::ComputationPoolSize,
        Knob::RequestBufferSize,
        Knob::ResponseBufferSize,
        Knob::KvEndpoints,
        Knob::ViewEndpoints,
        Knob::QueryEndpoints,
        Knob::PackageNameAndVersion,
        Knob::UserAgent,
        Knob::MaxRequestLifetime,
        Knob::KeepAliveInterval,
        Knob::AutoreleaseAfter,
    ];

    /// Override key, without the namespace.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Knob::DcpEnabled => "dcpEnabled",
            Knob::SslEnabled => "sslEnabled",
            Knob::SslKeystoreFile => "sslKeystoreFile",
            Knob::SslKeystorePassword => "sslKeystorePassword",
            Knob::QueryEnabled => "queryEnabled",
            Knob::QueryPort => "queryPort",
            Knob::BootstrapHttpEnabled => "bootstrapHttpEnabled",
            Knob::BootstrapCarrierEnabled => "bootstrapCarrierEnabled",
            Knob::BootstrapHttpDirectPort => "bootstrapHttpDirectPort",
            Knob::BootstrapHttpSslPort => "bootstrapHttpSslPort",
            Knob::BootstrapCarrierDirectPort => "bootstrapCarrierDirectPort",
            Knob::BootstrapCarrierSslPort => "bootstrapCarrierSslPort",
            Knob::IoPoolSize => "ioPoolSize",
            Knob::ComputationPoolSize => "computationPoolSize",
            Knob::RequestBufferSize => "requestBufferSize",
            Knob::ResponseBufferSize => "responseBufferSize",
            Knob::KvEndpoints => "kvEndpoints",
            Knob::ViewEndpoints => "viewEndpoints",
            Knob::QueryEndpoints => "queryEndpoints",
            Knob::PackageNameAndVersion => "packageNameAndVersion",
            Knob::UserAgent => "userAgent",
            Knob::MaxRequestLifetime => "maxRequestLifetime",
            Knob::KeepAliveInterval => "keepAliveInterval",
            Knob::AutoreleaseAfter => "autoreleaseAfter",
        }
    }

    /// Environment variable spelling, e.g. `KVLINK_IO_POOL_SIZE`.
    #[must_use]
    pub fn env_var(self) -> String {
        let mut var = String::from("KVLINK_");
        for c in self.name().chars() {
            if c.is_ascii_uppercase() {
                var.push('_');
            }
            var.push(c.to_ascii_uppercase());
        }
        var
    }

    /// Look a knob up by its override key, with or without the namespace.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Knob> {
        let name = key.strip_prefix(super::overrides::NAMESPACE).unwrap_or(key);
        Knob::ALL.into_iter().find(|knob| knob.name() == name)
    }
}

impl fmt::Display for Knob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", super::overrides::NAMESPACE, self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_var_spelling() {
        assert_eq!(Knob::IoPoolSize.env_var(), "KVLINK_IO_POOL_SIZE");
        assert_eq!(Knob::KvEndpoints.env_var(), "KVLINK_KV_ENDPOINTS");
        assert_eq!(Knob::DcpEnabled.env_var(), "KVLINK_DCP_ENABLED");
    }

    #[test]
    fn test_from_key_accepts_namespaced_and_bare() {
        assert_eq!(Knob::from_key("kvlink.ioPoolSize"), Some(Knob::IoPoolSize));
        assert_eq!(Knob::from_key("queryPort"), Some(Knob::QueryPort));
        assert_eq!(Knob::from_key("kvlink.nope"), None);
        assert!(Knob::ALL.iter().all(|k| Knob::from_key(&k.to_string()) == Some(*k)));
    }
}
