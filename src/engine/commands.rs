//! # Deferred Commands
//!
//! Systems never mutate the world directly; they enqueue closures into a
//! concurrent command queue that the application drains single-threaded
//! between stages.
//!
//! ## Queue design
//!
//! [`CommandQueue`] is the classic two-lock queue: a singly-linked list
//! with a *dummy tail* node, a producer-side tail mutex and a
//! consumer-side head mutex. Splitting the locks keeps `push` and a
//! concurrent pop contention-free on a non-empty queue; the dummy node
//! removes the empty-queue special case. A condition variable paired with
//! the head lock backs the blocking [`CommandQueue::wait_and_pop`].
//!
//! ## Drain semantics
//!
//! [`CommandQueue::execute`] acquires both locks and pops until the head
//! reaches the tail, invoking each closure in FIFO push order. Execution
//! is strictly serial and single-threaded by construction. Commands must
//! not enqueue further commands while the drain holds both locks.
//!
//! ## Commands facade
//!
//! [`Commands`] builds the deferred world mutations — spawn, destroy,
//! attach, detach, resource insertion and removal — as closures over
//! `&mut World`, matching the drain point's exclusive access.

use std::sync::{Condvar, Mutex};

use log::debug;

use crate::engine::component::{has_duplicate_ids, ComponentBundle, ComponentSet};
use crate::engine::entity::Entity;
use crate::engine::world::{Resource, World};

/// A deferred mutation: a one-shot closure over the drain context.
pub type CommandFn<Ctx> = Box<dyn FnOnce(&mut Ctx) + Send>;

struct Node<Ctx> {
    data: Option<CommandFn<Ctx>>,
    next: Option<Box<Node<Ctx>>>,
}

impl<Ctx> Node<Ctx> {
    fn dummy() -> Box<Self> {
        Box::new(Self {
            data: None,
            next: None,
        })
    }
}

/// Two-lock MPMC queue of deferred commands.
///
/// Safe for any number of concurrent producers; draining is serial.
pub struct CommandQueue<Ctx> {
    head: Mutex<Box<Node<Ctx>>>,
    // Always points at the dummy node terminating the chain owned by
    // `head`; dereferenced only while the tail mutex is held.
    tail: Mutex<*mut Node<Ctx>>,
    ready: Condvar,
}

// SAFETY: the raw tail pointer refers into the chain owned by `head` and is
// only ever read or written under the tail mutex; stored closures are
// `Send`. No `Ctx` value is stored in the queue itself.
unsafe impl<Ctx> Send for CommandQueue<Ctx> {}
// SAFETY: all interior access goes through the head/tail mutexes.
unsafe impl<Ctx> Sync for CommandQueue<Ctx> {}

impl<Ctx> Default for CommandQueue<Ctx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<Ctx> CommandQueue<Ctx> {
    /// Creates an empty queue holding only the dummy node.
    pub fn new() -> Self {
        let mut head = Node::dummy();
        let tail: *mut Node<Ctx> = &mut *head;
        Self {
            head: Mutex::new(head),
            tail: Mutex::new(tail),
            ready: Condvar::new(),
        }
    }

    /// Enqueues a command at the tail.
    ///
    /// The command is installed into the current dummy node, a fresh dummy
    /// is linked behind it, and the tail advances. Only the tail lock is
    /// taken, so producers never contend with a consumer popping the head
    /// of a non-empty queue.
    pub fn push(&self, command: impl FnOnce(&mut Ctx) + Send + 'static) {
        let mut new_dummy = Node::dummy();
        let new_tail: *mut Node<Ctx> = &mut *new_dummy;

        {
            let mut tail = self.tail.lock().unwrap();
            // SAFETY: `*tail` is the live dummy node of the chain; the tail
            // mutex is held.
            unsafe {
                (**tail).data = Some(Box::new(command));
                (**tail).next = Some(new_dummy);
            }
            *tail = new_tail;
        }

        self.ready.notify_one();
    }

    fn tail_ptr(&self) -> *mut Node<Ctx> {
        *self.tail.lock().unwrap()
    }

    /// Unlinks and returns the head node. Caller must hold the head lock
    /// and have verified `head != tail`.
    fn pop_head(head: &mut Box<Node<Ctx>>) -> Box<Node<Ctx>> {
        let next = head
            .next
            .take()
            .expect("a head distinct from the tail is always linked");
        std::mem::replace(head, next)
    }

    /// Pops the oldest command without blocking, if one is queued.
    pub fn try_pop(&self) -> Option<CommandFn<Ctx>> {
        let mut head = self.head.lock().unwrap();
        if std::ptr::eq(&**head, self.tail_ptr()) {
            return None;
        }

        let mut node = Self::pop_head(&mut head);
        node.data.take()
    }

    /// Pops the oldest command, blocking until one is available.
    pub fn wait_and_pop(&self) -> CommandFn<Ctx> {
        let mut head = self.head.lock().unwrap();
        loop {
            let tail = self.tail_ptr();
            if !std::ptr::eq(&**head, tail) {
                break;
            }
            head = self.ready.wait(head).unwrap();
        }

        let mut node = Self::pop_head(&mut head);
        node.data
            .take()
            .expect("a popped non-dummy node carries a command")
    }

    /// Returns `true` if no commands are queued.
    pub fn is_empty(&self) -> bool {
        let head = self.head.lock().unwrap();
        std::ptr::eq(&**head, self.tail_ptr())
    }

    /// Drains the queue, invoking every command in FIFO push order.
    ///
    /// Holds both locks for the whole drain; producers block until it
    /// finishes. Returns the number of commands applied.
    pub fn execute(&self, ctx: &mut Ctx) -> usize {
        let mut head = self.head.lock().unwrap();
        let tail = self.tail.lock().unwrap();

        let mut applied = 0;
        while !std::ptr::eq(&**head, *tail) {
            let mut node = Self::pop_head(&mut head);
            let command = node
                .data
                .take()
                .expect("a popped non-dummy node carries a command");
            command(ctx);
            applied += 1;
        }
        applied
    }

    /// Drops every queued command without invoking it.
    pub fn clear(&self) {
        let mut head = self.head.lock().unwrap();
        let tail = self.tail.lock().unwrap();

        while !std::ptr::eq(&**head, *tail) {
            drop(Self::pop_head(&mut head));
        }
    }
}

impl<Ctx> Drop for CommandQueue<Ctx> {
    fn drop(&mut self) {
        // Unlink iteratively so a long queue cannot overflow the stack
        // through recursive box drops.
        if let Ok(head) = self.head.get_mut() {
            let mut next = head.next.take();
            while let Some(mut node) = next {
                next = node.next.take();
            }
        }
    }
}

/// Builder of deferred world mutations.
///
/// Every method enqueues a closure and returns `&Self` for chaining; the
/// world is untouched until [`Commands::execute`] runs at a drain point.
#[derive(Default)]
pub struct Commands {
    queue: CommandQueue<World>,
}

impl Commands {
    /// Creates an empty command buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defers the creation of an entity carrying `bundle`.
    ///
    /// Duplicate component types inside the bundle fail to compile.
    pub fn spawn<B: ComponentBundle>(&self, bundle: B) -> &Self {
        const {
            assert!(
                !has_duplicate_ids(B::TYPE_IDS),
                "duplicate component types in spawn bundle"
            )
        };
        self.queue.push(move |world: &mut World| {
            let entity = world.registry_mut().create_entity();
            world.registry_mut().attach_components(entity, bundle);
        });
        self
    }

    /// Defers the destruction of `entity`.
    pub fn destroy(&self, entity: Entity) -> &Self {
        self.queue.push(move |world: &mut World| {
            world.registry_mut().destroy_entity(entity);
        });
        self
    }

    /// Defers attaching `bundle` to `entity`.
    ///
    /// Duplicate component types inside the bundle fail to compile.
    pub fn attach<B: ComponentBundle>(&self, entity: Entity, bundle: B) -> &Self {
        const {
            assert!(
                !has_duplicate_ids(B::TYPE_IDS),
                "duplicate component types in attach bundle"
            )
        };
        self.queue.push(move |world: &mut World| {
            world.registry_mut().attach_components(entity, bundle);
        });
        self
    }

    /// Defers detaching the component pack `S` from `entity`.
    ///
    /// Duplicate component types inside the pack fail to compile.
    pub fn detach<S: ComponentSet + 'static>(&self, entity: Entity) -> &Self {
        const {
            assert!(
                !has_duplicate_ids(S::TYPE_IDS),
                "duplicate component types in detach pack"
            )
        };
        self.queue.push(move |world: &mut World| {
            world.registry_mut().detach_components::<S>(entity);
        });
        self
    }

    /// Defers inserting (or replacing) the resource `value`.
    pub fn add_resource<R: Resource>(&self, value: R) -> &Self {
        self.queue.push(move |world: &mut World| {
            world.resources_mut().upsert(value);
        });
        self
    }

    /// Defers inserting the default value of resource `R`.
    pub fn add_default_resource<R: Resource + Default>(&self) -> &Self {
        self.add_resource(R::default())
    }

    /// Defers removing the resource of type `R`.
    pub fn remove_resource<R: Resource>(&self) -> &Self {
        self.queue.push(move |world: &mut World| {
            world.resources_mut().remove::<R>();
        });
        self
    }

    /// Drains the buffer into `world`, applying commands in FIFO order.
    ///
    /// Returns the number of commands applied.
    pub fn execute(&self, world: &mut World) -> usize {
        let applied = self.queue.execute(world);
        if applied > 0 {
            debug!("applied {applied} deferred command(s)");
        }
        applied
    }

    /// Drops every queued command without applying it.
    pub fn clear(&self) {
        self.queue.clear();
    }

    /// Returns `true` if no commands are queued.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
