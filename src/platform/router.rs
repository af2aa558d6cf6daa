// ── Message router ────────────────────────────────────────────────────────────
//
// An ordered interceptor chain per message identifier with an explicit
// "not handled" sentinel.  This is the heart of window subclassing: each
// registered callback gets a chance at the message in registration order;
// the first `Some(result)` short-circuits, and if every callback returns
// `None` the caller falls through to the window's original procedure so
// default native behaviour (focus, drawing, keyboard navigation) survives.
//
// No Win32 types: handles and parameters travel as plain integers, which is
// what lets several concerns (caret tracking, theming, application logic)
// observe the same message on the same control without fighting over
// exclusive ownership — and what lets these rules be tested anywhere.

use std::collections::HashMap;
use std::rc::Rc;

/// Message parameters, as plain integers (`HWND`/`WPARAM`/`LPARAM` widths).
#[derive(Debug, Clone, Copy)]
pub(crate) struct MsgArgs {
    pub(crate) hwnd: isize,
    pub(crate) msg: u32,
    pub(crate) wparam: usize,
    pub(crate) lparam: isize,
}

/// A message callback.  `None` means "not handled, keep going".
///
/// `Rc<dyn Fn>` rather than `Box<dyn FnMut>`: dispatch clones the chain
/// before invoking it, so a callback may register or unregister callbacks
/// (theme toggles do) without holding a borrow of the router.
pub(crate) type Handler = Rc<dyn Fn(&MsgArgs) -> Option<isize>>;

/// Token returned by `register`, used to unregister one specific callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Token(u64);

/// Ordered per-message callback chains.
#[derive(Default)]
pub(crate) struct MessageRouter {
    chains: HashMap<u32, Vec<(Token, Handler)>>,
    next_token: u64,
}

impl MessageRouter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the chain for `msg`.  Order of registration is
    /// order of invocation.
    pub(crate) fn register(&mut self, msg: u32, handler: Handler) -> Token {
        let token = Token(self.next_token);
        self.next_token += 1;
        self.chains.entry(msg).or_default().push((token, handler));
        token
    }

    /// Remove one callback (`Some(token)`) or the whole chain (`None`).
    /// Unknown tokens and empty chains are no-ops.
    pub(crate) fn unregister(&mut self, msg: u32, token: Option<Token>) {
        match token {
            Some(t) => {
                if let Some(chain) = self.chains.get_mut(&msg) {
                    chain.retain(|(tok, _)| *tok != t);
                    if chain.is_empty() {
                        self.chains.remove(&msg);
                    }
                }
            }
            None => {
                self.chains.remove(&msg);
            }
        }
    }

    /// Snapshot the chain for `msg`.  Cloning `Rc`s is cheap and lets the
    /// caller drop its borrow before invoking anything, so a callback may
    /// mutate the router while the walk is in flight.
    pub(crate) fn chain(&self, msg: u32) -> Vec<Handler> {
        self.chains
            .get(&msg)
            .map(|c| c.iter().map(|(_, h)| Rc::clone(h)).collect())
            .unwrap_or_default()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    const WM_TEST: u32 = 0x0400;

    fn args(msg: u32) -> MsgArgs {
        MsgArgs {
            hwnd: 1,
            msg,
            wparam: 0,
            lparam: 0,
        }
    }

    /// Records its own id on invocation, returning `result`.
    fn recorder(log: Rc<RefCell<Vec<u32>>>, id: u32, result: Option<isize>) -> Handler {
        Rc::new(move |_| {
            log.borrow_mut().push(id);
            result
        })
    }

    /// The walk the window procedure performs: first `Some` wins, all-`None`
    /// falls through.
    fn dispatch(router: &MessageRouter, args: &MsgArgs) -> Option<isize> {
        for handler in router.chain(args.msg) {
            if let Some(result) = handler(args) {
                return Some(result);
            }
        }
        None
    }

    #[test]
    fn invocation_order_is_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut router = MessageRouter::new();
        for id in [1, 2, 3] {
            router.register(WM_TEST, recorder(Rc::clone(&log), id, None));
        }

        assert_eq!(dispatch(&router, &args(WM_TEST)), None);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn first_some_short_circuits() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut router = MessageRouter::new();
        router.register(WM_TEST, recorder(Rc::clone(&log), 1, None));
        router.register(WM_TEST, recorder(Rc::clone(&log), 2, Some(42)));
        router.register(WM_TEST, recorder(Rc::clone(&log), 3, None));

        assert_eq!(dispatch(&router, &args(WM_TEST)), Some(42));
        assert_eq!(*log.borrow(), vec![1, 2], "3 must never run");
    }

    #[test]
    fn falls_through_iff_every_callback_declines() {
        let mut router = MessageRouter::new();
        // No chain at all.
        assert_eq!(dispatch(&router, &args(WM_TEST)), None);
        // A chain where everyone declines.
        router.register(WM_TEST, Rc::new(|_| None));
        router.register(WM_TEST, Rc::new(|_| None));
        assert_eq!(dispatch(&router, &args(WM_TEST)), None);
        // One opts in; no more fall-through.
        router.register(WM_TEST, Rc::new(|_| Some(0)));
        assert_eq!(dispatch(&router, &args(WM_TEST)), Some(0));
    }

    #[test]
    fn unregister_single_token_keeps_order_of_rest() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut router = MessageRouter::new();
        let _t1 = router.register(WM_TEST, recorder(Rc::clone(&log), 1, None));
        let t2 = router.register(WM_TEST, recorder(Rc::clone(&log), 2, None));
        let _t3 = router.register(WM_TEST, recorder(Rc::clone(&log), 3, None));

        router.unregister(WM_TEST, Some(t2));
        dispatch(&router, &args(WM_TEST));
        assert_eq!(*log.borrow(), vec![1, 3]);
    }

    #[test]
    fn unregister_all_clears_the_chain() {
        let mut router = MessageRouter::new();
        router.register(WM_TEST, Rc::new(|_| Some(1)));
        router.register(WM_TEST, Rc::new(|_| Some(2)));
        router.unregister(WM_TEST, None);
        assert_eq!(dispatch(&router, &args(WM_TEST)), None);
        assert!(router.chain(WM_TEST).is_empty());
    }

    #[test]
    fn chains_are_per_message() {
        let mut router = MessageRouter::new();
        router.register(WM_TEST, Rc::new(|_| Some(7)));
        assert_eq!(dispatch(&router, &args(WM_TEST + 1)), None);
        assert_eq!(dispatch(&router, &args(WM_TEST)), Some(7));
    }

    #[test]
    fn handler_sees_the_message_arguments() {
        let mut router = MessageRouter::new();
        router.register(
            WM_TEST,
            Rc::new(|a: &MsgArgs| Some(a.wparam as isize + a.lparam)),
        );
        let out = dispatch(&router, &MsgArgs {
            hwnd: 1,
            msg: WM_TEST,
            wparam: 40,
            lparam: 2,
        });
        assert_eq!(out, Some(42));
    }
}
