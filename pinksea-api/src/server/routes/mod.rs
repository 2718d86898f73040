use crate::server::ServerRouter;

mod feed;

pub fn routes() -> ServerRouter {
    ServerRouter::new().merge(feed::routes())
}
