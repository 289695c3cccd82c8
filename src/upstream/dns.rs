//! Service name resolution for the outbound connector.

use std::error::Error;
use std::net::{IpAddr, SocketAddr};
use std::task::{Context, Poll};
use std::vec;

use futures_util::future::{self, BoxFuture, FutureExt};
use hyper_util::client::legacy::connect::dns::{GaiResolver, Name};
use tower::Service;

type BoxError = Box<dyn Error + Send + Sync>;

/// Resolver plugged into the backend connector.
///
/// In-cluster the system resolver turns `<svc>.<ns>.svc.cluster.local`
/// into the service IP. `Fixed` pins every name to one address, which lets
/// the router run against local backends outside a cluster.
#[derive(Clone)]
pub enum ServiceResolver {
    System(GaiResolver),
    Fixed(IpAddr),
}

impl ServiceResolver {
    pub fn new(fixed: Option<IpAddr>) -> Self {
        match fixed {
            Some(ip) => ServiceResolver::Fixed(ip),
            None => ServiceResolver::System(GaiResolver::new()),
        }
    }
}

impl Service<Name> for ServiceResolver {
    type Response = vec::IntoIter<SocketAddr>;
    type Error = BoxError;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        match self {
            ServiceResolver::System(gai) => gai.poll_ready(cx).map_err(Into::into),
            ServiceResolver::Fixed(_) => Poll::Ready(Ok(())),
        }
    }

    fn call(&mut self, name: Name) -> Self::Future {
        match self {
            ServiceResolver::System(gai) => {
                let lookup = gai.call(name);
                async move {
                    let addrs: Vec<SocketAddr> = lookup.await?.collect();
                    Ok(addrs.into_iter())
                }
                .boxed()
            }
            ServiceResolver::Fixed(ip) => {
                tracing::trace!(name = %name, ip = %ip, "Resolving service to fixed address");
                // The connector fills in the port from the target URL.
                future::ready(Ok(vec![SocketAddr::new(*ip, 0)].into_iter())).boxed()
            }
        }
    }
}
