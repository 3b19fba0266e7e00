use super::STATICS_TAR;
use super::*;
use crate::bitmap::ReqBitmap;
use crate::logger;
use std::sync::Mutex;

type MyArbiter = DrrArbiter<REQS>;

static C_HANDLES: Mutex<Vec<Option<MyArbiter>>> = Mutex::new(Vec::new());

fn alloc(arbiter: MyArbiter) -> i32 {
    let mut handles = C_HANDLES.lock().unwrap();
    let id = match handles.iter().position(|h| h.is_none()) {
        Some(id) => {
            handles[id] = Some(arbiter);
            id
        }
        None => {
            handles.push(Some(arbiter));
            handles.len() - 1
        }
    };
    tracing::event!(
        target: STATICS_TAR,
        logger::STATICS_CFG_LEVEL,
        name = "drr alloc",
        handle = id
    );
    id as i32
}

fn with_arbiter<R>(handle: i32, f: impl FnOnce(&mut MyArbiter) -> R) -> R {
    let mut handles = C_HANDLES.lock().unwrap();
    let arbiter = usize::try_from(handle)
        .ok()
        .and_then(|id| handles.get_mut(id))
        .and_then(|h| h.as_mut())
        .expect(&format!("drr arbiter {} does not exist!", handle));
    f(arbiter)
}

unsafe fn read_lanes(p: *const u32) -> [Credit; REQS] {
    let lanes = unsafe { std::slice::from_raw_parts(p, REQS) };
    array_init::array_init(|i| lanes[i])
}

/// Returns a handle, or -1 when a pointer is null or the configuration is rejected.
#[unsafe(no_mangle)]
unsafe extern "C" fn drr_new(
    quantum: *const u32,
    packet_size: *const u32,
    deficit_cap: *const u32,
) -> i32 {
    if quantum.is_null() || packet_size.is_null() || deficit_cap.is_null() {
        return -1;
    }
    let (quantum, packet_size, deficit_cap) =
        unsafe { (read_lanes(quantum), read_lanes(packet_size), read_lanes(deficit_cap)) };
    match MyArbiter::new(quantum, packet_size, deficit_cap) {
        Ok(arbiter) => alloc(arbiter),
        Err(e) => {
            tracing::warn!("drr_new: {}", e);
            -1
        }
    }
}

#[unsafe(no_mangle)]
unsafe extern "C" fn drr_new_reference() -> i32 {
    alloc(MyArbiter::reference())
}

#[unsafe(no_mangle)]
unsafe extern "C" fn drr_reset(handle: i32) {
    with_arbiter(handle, |a| a.reset())
}

/// Lane `i` of `request` is bit `i`; the grant is returned the same way.
#[unsafe(no_mangle)]
unsafe extern "C" fn drr_step(handle: i32, request: u32) -> u32 {
    with_arbiter(handle, |a| {
        a.step(ReqBitmap::from_bits(u64::from(request))).bits() as u32
    })
}

#[unsafe(no_mangle)]
unsafe extern "C" fn drr_deficit(handle: i32, id: u32) -> u32 {
    let id = id as usize;
    assert!(id < REQS, "drr_deficit: invalid requester id {}!", id);
    with_arbiter(handle, |a| a.deficit(id))
}

#[unsafe(no_mangle)]
unsafe extern "C" fn drr_mask(handle: i32) -> u32 {
    with_arbiter(handle, |a| a.mask().bits() as u32)
}

#[unsafe(no_mangle)]
unsafe extern "C" fn drr_free(handle: i32) {
    let mut handles = C_HANDLES.lock().unwrap();
    usize::try_from(handle)
        .ok()
        .and_then(|id| handles.get_mut(id))
        .and_then(|h| h.take())
        .expect(&format!("drr arbiter {} does not exist!", handle));
}
