//! Serving requests that arrive as link frames

use ledctl_hal::{OutputLine, ProportionalOutput};
use ledctl_protocol::{Frame, FrameError, Reply, Request, Status};

use super::{ControlPlane, Outcome};
use crate::device::{DeviceId, DeviceStore};
use crate::error::ControlError;
use crate::introspect;
use crate::power::PowerManager;
use crate::timer::Millis;

fn done<T>(_: T) -> Reply {
    Reply::Status(Status::Ok)
}

/// Execute one request against a device and build the reply
pub fn handle_request<L: OutputLine, P: ProportionalOutput>(
    store: &DeviceStore<L, P>,
    id: DeviceId,
    request: &Request,
    now: Millis,
) -> Reply {
    let control = ControlPlane::new(store);

    let result = match request {
        Request::Command(command) => control.execute(id, command, now).map(|outcome| {
            Reply::Status(match outcome {
                Outcome::Applied => Status::Ok,
                Outcome::NotImplemented => Status::NotImplemented,
            })
        }),
        Request::ReadState => control.read_state(id).map(Reply::State),
        Request::WriteState(bytes) => control.write_state(id, bytes).map(done),
        Request::Suspend => PowerManager::new(store).suspend(id).map(done),
        Request::Resume => PowerManager::new(store).resume(id).map(done),
        Request::Introspect => {
            introspect::snapshot(store, id, now).map(|snap| Reply::Introspection(snap.into()))
        }
        Request::SetThreshold(celsius) => {
            introspect::set_thermal_threshold(store, id, *celsius).map(done)
        }
    };

    result.unwrap_or_else(|e: ControlError| {
        debug!("request failed: {:?}", e);
        Reply::Status(e.into())
    })
}

/// Decode a request frame, execute it, and build the reply frame
///
/// The frame's device byte is the slot index of the target device.
pub fn handle_frame<L: OutputLine, P: ProportionalOutput>(
    store: &DeviceStore<L, P>,
    frame: &Frame,
    now: Millis,
) -> Result<Frame, FrameError> {
    let reply = match store.id_at(usize::from(frame.device)) {
        None => Reply::Status(Status::NoDevice),
        Some(id) => match Request::from_frame(frame) {
            Ok(request) => handle_request(store, id, &request, now),
            Err(e) => Reply::Status(ControlError::from(e).into()),
        },
    };
    reply.to_frame(frame.device, frame.opcode)
}
