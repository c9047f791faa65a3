use std::time::{Duration, Instant};

use actix::prelude::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::domain::{GameId, SessionEvent};
use crate::errors::ErrorCode;
use crate::services::gateway::{Dispatch, Scope, Subscription};
use crate::state::app_state::AppState;
use crate::ws::hub::RoomBroadcast;
use crate::ws::protocol::{ClientMsg, ServerMsg, PROTOCOL_VERSION};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(20);
const CLIENT_TIMEOUT: Duration = Duration::from_secs(40);

pub async fn upgrade(
    req: HttpRequest,
    stream: web::Payload,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session = WsSession::new(Uuid::new_v4(), app_state);
    ws::start(session, &req, stream)
}

/// The room this connection follows, and the stream feeding its events.
struct AttachedRoom {
    game_id: GameId,
    events: SpawnHandle,
}

pub struct WsSession {
    conn_id: Uuid,
    /// The connection id doubles as the player id.
    player_id: String,
    app_state: web::Data<AppState>,
    room: Option<AttachedRoom>,

    last_heartbeat: Instant,
    heartbeat_handle: Option<SpawnHandle>,

    hello_done: bool,
}

impl WsSession {
    fn new(conn_id: Uuid, app_state: web::Data<AppState>) -> Self {
        Self {
            conn_id,
            player_id: conn_id.to_string(),
            app_state,
            room: None,
            last_heartbeat: Instant::now(),
            heartbeat_handle: None,
            hello_done: false,
        }
    }

    fn send_json(ctx: &mut ws::WebsocketContext<Self>, msg: &ServerMsg) {
        match serde_json::to_string(msg) {
            Ok(payload) => ctx.text(payload),
            Err(err) => warn!(error = %err, "[WS SESSION] failed to serialize outbound message"),
        }
    }

    fn send_error_and_close(
        &self,
        ctx: &mut ws::WebsocketContext<Self>,
        code: ErrorCode,
        message: impl Into<String>,
    ) {
        let msg = ServerMsg::Error {
            code,
            message: message.into(),
        };
        Self::send_json(ctx, &msg);
        ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
        ctx.stop();
    }

    fn start_heartbeat(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let handle = ctx.run_interval(HEARTBEAT_INTERVAL, |actor, ctx| {
            if Instant::now().duration_since(actor.last_heartbeat) > CLIENT_TIMEOUT {
                warn!(conn_id = %actor.conn_id, "[WS SESSION] heartbeat timed out");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Normal)));
                ctx.stop();
                return;
            }
            ctx.ping(b"keepalive");
        });
        self.heartbeat_handle = Some(handle);
    }

    /// Stop following the current room, if any.
    fn detach(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        if let Some(room) = self.room.take() {
            ctx.cancel_future(room.events);
            self.app_state.hub.leave(&room.game_id, self.conn_id);
        }
    }

    fn in_room(&self, game_id: &str) -> bool {
        self.room.as_ref().is_some_and(|room| room.game_id == game_id)
    }

    /// Route a gateway result: update subscriptions first so a joining
    /// connection receives its own room broadcast.
    fn apply(&mut self, dispatch: Dispatch, ctx: &mut ws::WebsocketContext<Self>) {
        match dispatch.subscription {
            Some(Subscription::Joined { game_id, events }) => {
                self.detach(ctx);
                let handle = ctx.add_stream(BroadcastStream::new(events));
                self.app_state
                    .hub
                    .join(&game_id, self.conn_id, ctx.address().recipient());
                self.room = Some(AttachedRoom {
                    game_id,
                    events: handle,
                });
            }
            Some(Subscription::Left { .. }) => self.detach(ctx),
            None => {}
        }

        match dispatch.scope {
            Scope::Room(game_id) => {
                self.app_state.hub.broadcast(
                    &game_id,
                    RoomBroadcast {
                        feedback: dispatch.feedback.clone(),
                    },
                );
                if !self.in_room(&game_id) {
                    Self::send_json(
                        ctx,
                        &ServerMsg::Feedback {
                            feedback: dispatch.feedback,
                        },
                    );
                }
            }
            Scope::Private => Self::send_json(
                ctx,
                &ServerMsg::Feedback {
                    feedback: dispatch.feedback,
                },
            ),
        }
    }
}

impl Actor for WsSession {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        info!(conn_id = %self.conn_id, "[WS SESSION] started");
        self.start_heartbeat(ctx);
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        if let Some(room) = self.room.take() {
            self.app_state.hub.leave(&room.game_id, self.conn_id);
        }
        if let Some(dispatch) = self.app_state.gateway.disconnect(&self.player_id) {
            if let Scope::Room(game_id) = &dispatch.scope {
                self.app_state.hub.broadcast(
                    game_id,
                    RoomBroadcast {
                        feedback: dispatch.feedback,
                    },
                );
            }
        }
        info!(conn_id = %self.conn_id, "[WS SESSION] stopped");
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsSession {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(payload)) => {
                self.last_heartbeat = Instant::now();
                ctx.pong(&payload);
            }
            Ok(ws::Message::Pong(_)) => {
                self.last_heartbeat = Instant::now();
            }
            Ok(ws::Message::Text(text)) => {
                self.last_heartbeat = Instant::now();

                let parsed: Result<ClientMsg, _> = serde_json::from_str(&text);
                let Ok(msg) = parsed else {
                    self.send_error_and_close(ctx, ErrorCode::BadRequest, "Malformed JSON");
                    return;
                };

                match msg {
                    ClientMsg::Hello { protocol } => {
                        if protocol != PROTOCOL_VERSION {
                            self.send_error_and_close(
                                ctx,
                                ErrorCode::BadProtocol,
                                "Unsupported protocol version",
                            );
                            return;
                        }
                        self.hello_done = true;
                        Self::send_json(
                            ctx,
                            &ServerMsg::HelloAck {
                                protocol: PROTOCOL_VERSION,
                                player_id: self.player_id.clone(),
                            },
                        );
                    }

                    ClientMsg::Command { command } => {
                        if !self.hello_done {
                            self.send_error_and_close(
                                ctx,
                                ErrorCode::BadRequest,
                                "Must send hello first",
                            );
                            return;
                        }
                        let dispatch = self.app_state.gateway.dispatch(&self.player_id, command);
                        self.apply(dispatch, ctx);
                    }
                }
            }
            Ok(ws::Message::Binary(_)) => {
                self.last_heartbeat = Instant::now();
                self.send_error_and_close(ctx, ErrorCode::BadRequest, "Binary not supported");
            }
            Ok(ws::Message::Close(reason)) => {
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {
                self.last_heartbeat = Instant::now();
            }
            Err(err) => {
                warn!(conn_id = %self.conn_id, error = %err, "[WS SESSION] protocol error");
                ctx.close(Some(ws::CloseReason::from(ws::CloseCode::Error)));
                ctx.stop();
            }
        }
    }
}

/// Session events for the attached room.
impl StreamHandler<Result<SessionEvent, BroadcastStreamRecvError>> for WsSession {
    fn handle(
        &mut self,
        item: Result<SessionEvent, BroadcastStreamRecvError>,
        ctx: &mut Self::Context,
    ) {
        match item {
            Ok(event) => Self::send_json(ctx, &ServerMsg::Event { event }),
            Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                warn!(conn_id = %self.conn_id, skipped, "[WS SESSION] event stream lagged");
            }
        }
    }

    // The room closing must not close the connection.
    fn finished(&mut self, _ctx: &mut Self::Context) {
        debug!(conn_id = %self.conn_id, "[WS SESSION] room event stream ended");
    }
}

impl Handler<RoomBroadcast> for WsSession {
    type Result = ();

    fn handle(&mut self, msg: RoomBroadcast, ctx: &mut Self::Context) -> Self::Result {
        Self::send_json(
            ctx,
            &ServerMsg::Feedback {
                feedback: msg.feedback,
            },
        );
    }
}
