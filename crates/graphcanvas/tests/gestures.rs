// SPDX-License-Identifier: MIT OR Apache-2.0
//! End-to-end gesture tests driving a canvas with raw pointer input.

use egui::{CursorIcon, Key, Modifiers, PointerButton, Pos2, Vec2};
use graphcanvas::hit_test::{hit_test, HitOptions};
use graphcanvas::model::graph::RerouteSplice;
use graphcanvas::model::slot::SlotKind;
use graphcanvas::model::widget::Widget;
use graphcanvas::settings::LinkReleaseAction;
use graphcanvas::{
    CanvasEvent, CanvasSettings, EventQueue, Graph, GraphCanvas, Group, HitTarget, ItemId, LinkId,
    Node, NodeId, PointerEvent,
};

const A_OUT: Pos2 = Pos2::new(131.0, 14.0);
const B_IN: Pos2 = Pos2::new(410.0, 14.0);
const LINK_CENTRE: Pos2 = Pos2::new(270.5, 14.0);

fn canvas_with(settings: CanvasSettings) -> (GraphCanvas, EventQueue) {
    let queue = EventQueue::new();
    let canvas = GraphCanvas::new(Vec2::new(800.0, 600.0), settings)
        .unwrap()
        .with_host(Box::new(queue.clone()));
    (canvas, queue)
}

fn canvas() -> (GraphCanvas, EventQueue) {
    canvas_with(CanvasSettings::default())
}

/// A(float out) at the origin, B(float in) to the right, C(string in) below B
fn scene() -> (Graph, NodeId, NodeId, NodeId) {
    let mut graph = Graph::new("scene");
    let a = graph.add_node(
        Node::new("math", "A")
            .with_output("out", "float")
            .with_size(140.0, 60.0),
    );
    let b = graph.add_node(
        Node::new("math", "B")
            .with_position(400.0, 0.0)
            .with_input("in", "float")
            .with_size(140.0, 60.0),
    );
    let c = graph.add_node(
        Node::new("text", "C")
            .with_position(400.0, 200.0)
            .with_input("s", "string")
            .with_size(140.0, 60.0),
    );
    (graph, a, b, c)
}

fn linked_scene() -> (Graph, NodeId, NodeId, LinkId) {
    let (mut graph, a, b, _) = scene();
    let link = graph.connect(a, 0, b, 0, None).unwrap();
    (graph, a, b, link)
}

fn at(pos: Pos2, t: f64) -> PointerEvent {
    PointerEvent::primary(pos, t)
}

fn click(canvas: &mut GraphCanvas, graph: &mut Graph, pos: Pos2, t: f64, modifiers: Modifiers) {
    canvas.pointer_down(graph, at(pos, t).with_modifiers(modifiers));
    canvas.pointer_up(graph, at(pos, t + 10.0).with_modifiers(modifiers));
}

fn drag(
    canvas: &mut GraphCanvas,
    graph: &mut Graph,
    from: Pos2,
    to: Pos2,
    t: f64,
    modifiers: Modifiers,
) {
    canvas.pointer_down(graph, at(from, t).with_modifiers(modifiers));
    canvas.pointer_move(graph, at(from.lerp(to, 0.5), t + 10.0).with_modifiers(modifiers));
    canvas.pointer_move(graph, at(to, t + 20.0).with_modifiers(modifiers));
    canvas.pointer_up(graph, at(to, t + 30.0).with_modifiers(modifiers));
}

#[test]
fn test_click_under_threshold_selects_without_moving() {
    let (mut graph, a, _, _) = scene();
    let (mut canvas, _) = canvas();

    canvas.pointer_down(&mut graph, at(Pos2::new(60.0, 40.0), 0.0));
    canvas.pointer_move(&mut graph, at(Pos2::new(62.0, 41.0), 10.0));
    assert!(!canvas.gesture().dragging_items());
    canvas.pointer_up(&mut graph, at(Pos2::new(62.0, 41.0), 20.0));

    assert!(canvas.selection().is_selected(ItemId::Node(a)));
    assert_eq!(graph.node(a).unwrap().pos, [0.0, 0.0]);
    assert_eq!(graph.history().undo_depth(), 0);
}

#[test]
fn test_drag_moves_whole_selection_in_one_undo_step() {
    let (mut graph, a, b, _) = scene();
    let (mut canvas, _) = canvas();
    click(&mut canvas, &mut graph, Pos2::new(60.0, 40.0), 0.0, Modifiers::NONE);
    click(&mut canvas, &mut graph, Pos2::new(460.0, 40.0), 1000.0, Modifiers::SHIFT);
    assert_eq!(canvas.selection().len(), 2);

    canvas.pointer_down(&mut graph, at(Pos2::new(60.0, 40.0), 2000.0));
    canvas.pointer_move(&mut graph, at(Pos2::new(80.0, 40.0), 2010.0));
    assert!(canvas.gesture().dragging_items());
    canvas.pointer_move(&mut graph, at(Pos2::new(100.0, 50.0), 2020.0));
    canvas.pointer_up(&mut graph, at(Pos2::new(100.0, 50.0), 2030.0));

    assert_eq!(graph.node(a).unwrap().pos, [40.0, 10.0]);
    assert_eq!(graph.node(b).unwrap().pos, [440.0, 10.0]);
    assert_eq!(graph.history().undo_depth(), 1);
    assert_eq!(graph.history().open_depth(), 0);

    assert!(canvas.key_down(&mut graph, Key::Z, Modifiers::CTRL));
    assert_eq!(graph.node(a).unwrap().pos, [0.0, 0.0]);
    assert_eq!(graph.node(b).unwrap().pos, [400.0, 0.0]);
}

#[test]
fn test_cancel_runs_cleanup_once() {
    let (mut graph, a, _, _) = scene();
    let (mut canvas, _) = canvas();

    canvas.pointer_down(&mut graph, at(Pos2::new(60.0, 40.0), 0.0));
    canvas.pointer_move(&mut graph, at(Pos2::new(90.0, 40.0), 10.0));
    assert_eq!(graph.history().open_depth(), 1);

    canvas.pointer_cancel(&mut graph);
    assert!(canvas.gesture().is_idle());
    assert_eq!(graph.history().open_depth(), 0);
    assert_eq!(graph.history().undo_depth(), 1);

    canvas.pointer_cancel(&mut graph);
    assert_eq!(graph.history().open_depth(), 0);
    assert_eq!(graph.node(a).unwrap().pos, [30.0, 0.0]);

    // A later press starts a fresh cycle
    click(&mut canvas, &mut graph, Pos2::new(500.0, 500.0), 1000.0, Modifiers::NONE);
    assert!(canvas.selection().is_empty());
}

#[test]
fn test_escape_cancels_resize() {
    let (mut graph, a, _, _) = scene();
    let (mut canvas, _) = canvas();

    canvas.pointer_down(&mut graph, at(Pos2::new(135.0, 55.0), 0.0));
    assert!(canvas.gesture().resizing_node());
    canvas.pointer_move(&mut graph, at(Pos2::new(175.0, 95.0), 10.0));
    assert_eq!(graph.node(a).unwrap().size, [180.0, 100.0]);

    assert!(canvas.key_down(&mut graph, Key::Escape, Modifiers::NONE));
    assert!(canvas.gesture().is_idle());
    assert_eq!(graph.history().open_depth(), 0);
    canvas.pointer_up(&mut graph, at(Pos2::new(175.0, 95.0), 20.0));
    assert!(canvas.gesture().is_idle());
}

#[test]
fn test_drag_from_output_connects_to_input() {
    let (mut graph, a, b, _) = scene();
    let (mut canvas, queue) = canvas();

    canvas.pointer_down(&mut graph, at(A_OUT, 0.0));
    assert!(canvas.gesture().connecting_links().is_some());
    canvas.pointer_move(&mut graph, at(B_IN, 10.0));
    assert!(canvas.hover().drop_target.is_some());
    canvas.pointer_up(&mut graph, at(B_IN, 20.0));

    assert_eq!(graph.link_count(), 1);
    let link = graph.links().next().unwrap();
    assert_eq!((link.origin_id, link.target_id), (a, b));
    assert!(queue.is_empty());
    assert_eq!(graph.history().undo_depth(), 1);
}

#[test]
fn test_incompatible_drop_leaves_graph_untouched() {
    let (mut graph, _, _, _) = scene();
    let (mut canvas, queue) = canvas();

    drag(&mut canvas, &mut graph, A_OUT, Pos2::new(410.0, 214.0), 0.0, Modifiers::NONE);

    assert_eq!(graph.link_count(), 0);
    assert_eq!(graph.history().undo_depth(), 0);
    assert!(queue.is_empty());
    assert!(canvas.gesture().is_idle());
}

#[test]
fn test_release_on_empty_emits_events() {
    let (mut graph, a, _, _) = scene();
    let (mut canvas, queue) = canvas();

    drag(&mut canvas, &mut graph, A_OUT, Pos2::new(250.0, 400.0), 0.0, Modifiers::NONE);

    let events = queue.drain();
    assert_eq!(events.len(), 2);
    match &events[0] {
        CanvasEvent::EmptyRelease { links, pos, input } => {
            assert_eq!(links[0].node, a);
            assert_eq!(links[0].kind, SlotKind::Output);
            assert_eq!(*pos, Pos2::new(250.0, 400.0));
            assert_eq!(input.button, PointerButton::Primary);
            assert_eq!(input.time_ms, 30.0);
        }
        other => panic!("unexpected event {other:?}"),
    }
    assert!(matches!(
        events[1],
        CanvasEvent::LinkReleaseMenu {
            action: LinkReleaseAction::ContextMenu,
            ..
        }
    ));
}

#[test]
fn test_prevented_empty_release_skips_menu() {
    let (mut graph, _, _, _) = scene();
    let (mut canvas, queue) = canvas();
    queue.prevent_default_when(|e| matches!(e, CanvasEvent::EmptyRelease { .. }));

    drag(&mut canvas, &mut graph, A_OUT, Pos2::new(250.0, 400.0), 0.0, Modifiers::NONE);

    let events = queue.drain();
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], CanvasEvent::EmptyRelease { .. }));
}

#[test]
fn test_drop_on_accepting_widget_emits_event() {
    let (mut graph, _, _, _) = scene();
    let d = graph.add_node(
        Node::new("math", "D")
            .with_position(400.0, 300.0)
            .with_widget(Widget::number("value", 0.0, 0.0, 10.0, 1.0).accepting_links("float"))
            .with_size(140.0, 60.0),
    );
    let (mut canvas, queue) = canvas();

    drag(&mut canvas, &mut graph, A_OUT, Pos2::new(450.0, 340.0), 0.0, Modifiers::NONE);

    assert_eq!(graph.link_count(), 0);
    match queue.drain().as_slice() {
        [CanvasEvent::ConnectingToWidget {
            node,
            widget,
            link,
            input,
        }] => {
            assert_eq!((*node, *widget), (d, 0));
            assert_eq!(link.slot_type.0, "float");
            assert_eq!(input.pos, Pos2::new(450.0, 340.0));
        }
        other => panic!("unexpected events {other:?}"),
    }
}

#[test]
fn test_detach_input_link_and_drop_on_empty() {
    let (mut graph, _, b, _) = linked_scene();
    let (mut canvas, queue) = canvas();

    canvas.pointer_down(&mut graph, at(B_IN, 0.0));
    assert_eq!(graph.link_count(), 0);
    assert!(graph.node(b).unwrap().inputs[0].link.is_none());
    canvas.pointer_move(&mut graph, at(Pos2::new(300.0, 300.0), 10.0));
    canvas.pointer_up(&mut graph, at(Pos2::new(300.0, 300.0), 20.0));

    assert_eq!(graph.link_count(), 0);
    assert!(matches!(queue.drain().first(), Some(CanvasEvent::EmptyRelease { .. })));
    assert_eq!(graph.history().undo_depth(), 1);
    assert!(canvas.undo(&mut graph));
    assert_eq!(graph.link_count(), 1);
}

#[test]
fn test_detached_link_reconnects_elsewhere() {
    let (mut graph, a, b, _) = linked_scene();
    let e = graph.add_node(
        Node::new("math", "E")
            .with_position(400.0, 400.0)
            .with_input("in", "float")
            .with_size(140.0, 60.0),
    );
    let (mut canvas, _) = canvas();

    drag(&mut canvas, &mut graph, B_IN, Pos2::new(410.0, 414.0), 0.0, Modifiers::NONE);

    assert_eq!(graph.link_count(), 1);
    let link = graph.links().next().unwrap();
    assert_eq!((link.origin_id, link.target_id), (a, e));
    assert!(graph.node(b).unwrap().inputs[0].link.is_none());
    assert_eq!(graph.history().undo_depth(), 1);
}

#[test]
fn test_click_to_break_disconnects_immediately() {
    let (mut graph, _, _, _) = linked_scene();
    let settings = CanvasSettings {
        click_do_break_link_to: true,
        ..CanvasSettings::default()
    };
    let (mut canvas, _) = canvas_with(settings);

    canvas.pointer_down(&mut graph, at(B_IN, 0.0));
    assert!(canvas.gesture().is_idle());
    assert_eq!(graph.link_count(), 0);
    canvas.pointer_up(&mut graph, at(B_IN, 10.0));
    assert_eq!(graph.history().undo_depth(), 1);
}

#[test]
fn test_shift_drag_moves_all_output_links() {
    let (mut graph, a, b, c) = scene();
    let f = graph.add_node(
        Node::new("math", "F")
            .with_position(0.0, 300.0)
            .with_output("out", "float")
            .with_size(140.0, 60.0),
    );
    graph.connect(a, 0, b, 0, None).unwrap();
    let e = graph.add_node(
        Node::new("math", "E")
            .with_position(400.0, 400.0)
            .with_input("in", "float")
            .with_size(140.0, 60.0),
    );
    graph.connect(a, 0, e, 0, None).unwrap();
    let (mut canvas, _) = canvas();

    canvas.pointer_down(&mut graph, at(A_OUT, 0.0).with_modifiers(Modifiers::SHIFT));
    assert_eq!(canvas.gesture().connecting_links().unwrap().links.len(), 2);
    canvas.pointer_move(&mut graph, at(Pos2::new(131.0, 314.0), 10.0));
    canvas.pointer_up(&mut graph, at(Pos2::new(131.0, 314.0), 20.0));

    assert_eq!(graph.link_count(), 2);
    assert!(graph.links().all(|l| l.origin_id == f));
    assert!(graph.node(a).unwrap().outputs[0].links.is_empty());
    assert!(graph.node(c).unwrap().inputs[0].link.is_none());
}

#[test]
fn test_link_stroke_hit_after_draw() {
    let (mut graph, _, _, link) = linked_scene();
    let (mut canvas, _) = canvas();
    let options = HitOptions { link_width: 3.0 };

    // Nothing is hoverable before the first frame routes the link
    assert_eq!(hit_test(&graph, LINK_CENTRE, &options), HitTarget::Empty);
    canvas.draw_now(&mut graph, 0.0);

    let centre = graph.link(link).unwrap().render.centre.unwrap();
    assert!((centre - LINK_CENTRE).length() < 0.01);
    assert!(matches!(
        hit_test(&graph, centre, &options),
        HitTarget::Link { link: hit, .. } if hit == link
    ));
    let far = centre + Vec2::new(0.0, options.link_hit_width());
    assert_eq!(hit_test(&graph, far, &options), HitTarget::Empty);
}

#[test]
fn test_alt_on_link_inserts_reroute_and_drags_it() {
    let (mut graph, _, _, link) = linked_scene();
    let (mut canvas, _) = canvas();
    canvas.draw_now(&mut graph, 0.0);

    canvas.pointer_down(&mut graph, at(LINK_CENTRE, 0.0).with_modifiers(Modifiers::ALT));
    assert!(canvas.gesture().dragging_items());
    let reroute = graph.link(link).unwrap().parent_id.unwrap();
    assert!(canvas.selection().is_selected(ItemId::Reroute(reroute)));

    canvas.pointer_move(&mut graph, at(Pos2::new(270.0, 100.0), 10.0));
    canvas.pointer_up(&mut graph, at(Pos2::new(270.0, 100.0), 20.0));

    let r = graph.reroute(reroute).unwrap();
    assert_eq!(r.pos, [270.0, 100.0]);
    assert_eq!(graph.history().undo_depth(), 1);
    assert!(canvas.undo(&mut graph));
    assert!(graph.link(link).unwrap().parent_id.is_none());
}

#[test]
fn test_shift_on_link_starts_connection_from_origin() {
    let (mut graph, a, _, link) = linked_scene();
    let (mut canvas, _) = canvas();
    canvas.draw_now(&mut graph, 0.0);

    canvas.pointer_down(&mut graph, at(LINK_CENTRE, 0.0).with_modifiers(Modifiers::SHIFT));
    let connector = canvas.gesture().connecting_links().unwrap();
    assert_eq!(connector.links.len(), 1);
    assert_eq!(connector.links[0].node, a);
    assert_eq!(connector.links[0].from, SlotKind::Output);
    assert_eq!(graph.reroutes().count(), 0);

    canvas.pointer_cancel(&mut graph);
    assert!(graph.link(link).is_some());
}

#[test]
fn test_plain_link_click_emits_event() {
    let (mut graph, _, _, link) = linked_scene();
    let (mut canvas, queue) = canvas();
    canvas.draw_now(&mut graph, 0.0);

    click(&mut canvas, &mut graph, LINK_CENTRE, 0.0, Modifiers::NONE);
    assert!(matches!(
        queue.drain().as_slice(),
        [CanvasEvent::LinkClicked { link: hit, .. }] if *hit == link
    ));
}

#[test]
fn test_removing_sole_reroute_routes_directly() {
    let (mut graph, _, _, link) = linked_scene();
    let reroute = graph
        .create_reroute(Pos2::new(270.0, 150.0), RerouteSplice::OnLink(link))
        .unwrap();
    let (mut canvas, _) = canvas();
    canvas.draw_now(&mut graph, 0.0);
    let path = graph.link(link).unwrap().render.path.as_ref().unwrap();
    assert_eq!(path.start(), Pos2::new(270.0, 150.0));

    assert!(graph.remove_reroute(reroute));
    assert!(graph.link(link).unwrap().parent_id.is_none());
    canvas.draw_now(&mut graph, 16.0);

    let path = graph.link(link).unwrap().render.path.clone().unwrap();
    assert_eq!(path.start(), A_OUT);
    assert_eq!(path.end(), B_IN);
}

#[test]
fn test_marquee_replaces_selection() {
    let mut graph = Graph::new("marquee");
    let n1 = graph.add_node(Node::new("n", "N1").with_size(140.0, 60.0));
    let n2 = graph.add_node(Node::new("n", "N2").with_position(200.0, 0.0).with_size(140.0, 60.0));
    let group = graph.add_group(Group::new("G", Pos2::new(0.0, 150.0), Vec2::new(300.0, 150.0)));
    let far = graph.add_node(Node::new("n", "Far").with_position(1000.0, 1000.0));
    let (mut canvas, _) = canvas();
    canvas.selection_mut().select(&mut graph, ItemId::Node(far));

    let ctrl = |pos: Pos2, t: f64| at(pos, t).with_modifiers(Modifiers::CTRL);
    canvas.pointer_down(&mut graph, ctrl(Pos2::new(-50.0, -50.0), 0.0));
    canvas.pointer_move(&mut graph, ctrl(Pos2::new(200.0, 200.0), 10.0));
    assert!(canvas.gesture().dragging_rectangle().is_some());
    canvas.pointer_move(&mut graph, ctrl(Pos2::new(400.0, 350.0), 20.0));
    canvas.pointer_up(&mut graph, ctrl(Pos2::new(400.0, 350.0), 30.0));

    let selection = canvas.selection();
    assert!(selection.is_selected(ItemId::Node(n1)));
    assert!(selection.is_selected(ItemId::Node(n2)));
    assert!(selection.is_selected(ItemId::Group(group)));
    assert!(!selection.is_selected(ItemId::Node(far)));
    assert!(!graph.node(far).unwrap().selected);
    assert_eq!(selection.len(), 3);
}

#[test]
fn test_marquee_subtract_with_alt() {
    let (mut graph, a, b, _) = scene();
    let (mut canvas, _) = canvas();
    canvas.key_down(&mut graph, Key::A, Modifiers::CTRL);
    assert_eq!(canvas.selection().len(), 3);

    let m = Modifiers {
        alt: true,
        ctrl: true,
        ..Modifiers::NONE
    };
    drag(&mut canvas, &mut graph, Pos2::new(-20.0, -50.0), Pos2::new(200.0, 100.0), 0.0, m);

    assert!(!canvas.selection().is_selected(ItemId::Node(a)));
    assert!(canvas.selection().is_selected(ItemId::Node(b)));
    assert_eq!(canvas.selection().len(), 2);
}

#[test]
fn test_group_drag_moves_children() {
    let (mut graph, a, _, _) = scene();
    let group = graph.add_group(Group::new("G", Pos2::new(-20.0, -50.0), Vec2::new(200.0, 150.0)));
    let (mut canvas, _) = canvas();

    drag(
        &mut canvas,
        &mut graph,
        Pos2::new(160.0, -40.0),
        Pos2::new(180.0, -20.0),
        0.0,
        Modifiers::NONE,
    );

    assert_eq!(graph.group(group).unwrap().pos, [0.0, -30.0]);
    assert_eq!(graph.node(a).unwrap().pos, [20.0, 20.0]);
    assert!(canvas.selection().is_selected(ItemId::Group(group)));
}

#[test]
fn test_double_clicks_emit_events() {
    let (mut graph, a, _, _) = scene();
    let (mut canvas, queue) = canvas();

    click(&mut canvas, &mut graph, Pos2::new(300.0, 450.0), 0.0, Modifiers::NONE);
    assert!(queue.is_empty());
    click(&mut canvas, &mut graph, Pos2::new(301.0, 450.0), 100.0, Modifiers::SHIFT);
    assert!(matches!(
        queue.drain().as_slice(),
        [CanvasEvent::EmptyDoubleClick { input, .. }] if input.modifiers.shift
    ));

    click(&mut canvas, &mut graph, Pos2::new(60.0, 40.0), 1000.0, Modifiers::NONE);
    click(&mut canvas, &mut graph, Pos2::new(60.0, 40.0), 1100.0, Modifiers::NONE);
    assert!(matches!(
        queue.drain().as_slice(),
        [CanvasEvent::NodeDoubleClick { node, .. }] if *node == a
    ));

    // Too slow for a double click
    click(&mut canvas, &mut graph, Pos2::new(300.0, 450.0), 5000.0, Modifiers::NONE);
    click(&mut canvas, &mut graph, Pos2::new(300.0, 450.0), 6000.0, Modifiers::NONE);
    assert!(queue.is_empty());
}

#[test]
fn test_keyboard_delete_undo_and_paste() {
    let (mut graph, a, _, _) = linked_scene();
    let (mut canvas, _) = canvas();
    click(&mut canvas, &mut graph, Pos2::new(60.0, 40.0), 0.0, Modifiers::NONE);

    assert!(canvas.key_down(&mut graph, Key::C, Modifiers::CTRL));
    assert!(canvas.key_down(&mut graph, Key::Delete, Modifiers::NONE));
    assert!(graph.node(a).is_none());
    assert_eq!(graph.link_count(), 0);
    assert!(canvas.selection().is_empty());

    assert!(canvas.key_down(&mut graph, Key::Z, Modifiers::CTRL));
    assert!(graph.node(a).is_some());
    assert_eq!(graph.link_count(), 1);
    assert!(canvas.selection().is_selected(ItemId::Node(a)));

    let redo = Modifiers {
        ctrl: true,
        shift: true,
        ..Modifiers::NONE
    };
    assert!(canvas.key_down(&mut graph, Key::Z, redo));
    assert!(graph.node(a).is_none());

    canvas.pointer_move(&mut graph, at(Pos2::new(300.0, 500.0), 100.0));
    let before = graph.node_count();
    assert!(canvas.key_down(&mut graph, Key::V, Modifiers::CTRL));
    assert_eq!(graph.node_count(), before + 1);
    assert_eq!(canvas.selection().len(), 1);
}

#[test]
fn test_read_only_press_pans() {
    let (mut graph, a, _, _) = scene();
    let settings = CanvasSettings {
        read_only: true,
        ..CanvasSettings::default()
    };
    let (mut canvas, _) = canvas_with(settings);

    drag(
        &mut canvas,
        &mut graph,
        Pos2::new(60.0, 40.0),
        Pos2::new(100.0, 60.0),
        0.0,
        Modifiers::NONE,
    );

    assert_eq!(graph.node(a).unwrap().pos, [0.0, 0.0]);
    assert_eq!(canvas.transform().offset, Vec2::new(40.0, 20.0));
    assert!(!canvas.key_down(&mut graph, Key::Delete, Modifiers::NONE));
}

#[test]
fn test_empty_drag_pans_and_click_deselects() {
    let (mut graph, a, _, _) = scene();
    let (mut canvas, _) = canvas();
    click(&mut canvas, &mut graph, Pos2::new(60.0, 40.0), 0.0, Modifiers::NONE);

    drag(
        &mut canvas,
        &mut graph,
        Pos2::new(300.0, 450.0),
        Pos2::new(320.0, 470.0),
        1000.0,
        Modifiers::NONE,
    );
    assert_eq!(canvas.transform().offset, Vec2::new(20.0, 20.0));
    assert!(canvas.selection().is_selected(ItemId::Node(a)));

    click(&mut canvas, &mut graph, Pos2::new(300.0, 450.0), 2000.0, Modifiers::NONE);
    assert!(canvas.selection().is_empty());
}

#[test]
fn test_wheel_zoom_keeps_point_under_pointer() {
    let (mut canvas, _) = canvas();
    canvas.transform_mut().offset = Vec2::new(30.0, -20.0);
    let pointer = Pos2::new(400.0, 300.0);
    let before = canvas.transform().to_graph(pointer);

    canvas.wheel(pointer, 120.0);
    assert!((canvas.transform().scale - 1.1).abs() < 1e-5);
    let after = canvas.transform().to_graph(pointer);
    assert!((after - before).length() < 1e-3);
}

#[test]
fn test_hover_cursor() {
    let (mut graph, _, _, _) = scene();
    let (mut canvas, _) = canvas();

    canvas.pointer_move(&mut graph, at(Pos2::new(135.0, 55.0), 0.0));
    assert_eq!(canvas.cursor(), CursorIcon::ResizeNwSe);
    canvas.pointer_move(&mut graph, at(A_OUT, 10.0));
    assert_eq!(canvas.cursor(), CursorIcon::Crosshair);
    canvas.pointer_move(&mut graph, at(Pos2::new(60.0, 40.0), 20.0));
    assert_eq!(canvas.cursor(), CursorIcon::Grab);
    canvas.pointer_move(&mut graph, at(Pos2::new(300.0, 450.0), 30.0));
    assert_eq!(canvas.cursor(), CursorIcon::Default);
}

#[test]
fn test_other_buttons_ignored_while_held() {
    let (mut graph, _, _, _) = scene();
    let (mut canvas, queue) = canvas();

    canvas.pointer_down(&mut graph, at(Pos2::new(300.0, 450.0), 0.0));
    canvas.pointer_down(
        &mut graph,
        at(Pos2::new(300.0, 450.0), 5.0).with_button(PointerButton::Secondary),
    );
    assert!(queue.is_empty());
    canvas.pointer_up(&mut graph, at(Pos2::new(300.0, 450.0), 10.0));
    assert!(canvas.gesture().is_idle());
}

#[test]
fn test_secondary_click_does_not_pair_with_primary() {
    let (mut graph, _, _, _) = scene();
    let (mut canvas, queue) = canvas();
    let spot = Pos2::new(300.0, 450.0);

    canvas.pointer_down(&mut graph, at(spot, 0.0).with_button(PointerButton::Secondary));
    canvas.pointer_up(&mut graph, at(spot, 10.0).with_button(PointerButton::Secondary));
    match queue.drain().as_slice() {
        [CanvasEvent::ContextMenu { item: None, input, .. }] => {
            assert_eq!(input.button, PointerButton::Secondary);
        }
        other => panic!("unexpected events {other:?}"),
    }

    click(&mut canvas, &mut graph, spot, 100.0, Modifiers::NONE);
    assert!(queue.is_empty());
    click(&mut canvas, &mut graph, spot, 200.0, Modifiers::NONE);
    assert!(matches!(queue.drain().as_slice(), [CanvasEvent::EmptyDoubleClick { .. }]));
}

#[test]
fn test_secondary_release_keeps_primary_drag() {
    let (mut graph, a, _, _) = scene();
    let (mut canvas, _) = canvas();

    canvas.pointer_down(&mut graph, at(Pos2::new(60.0, 40.0), 0.0));
    canvas.pointer_move(&mut graph, at(Pos2::new(90.0, 40.0), 10.0));
    assert!(canvas.gesture().dragging_items());
    assert_eq!(graph.node(a).unwrap().pos, [30.0, 0.0]);

    let secondary = |t| at(Pos2::new(90.0, 40.0), t).with_button(PointerButton::Secondary);
    canvas.pointer_down(&mut graph, secondary(20.0));
    canvas.pointer_up(&mut graph, secondary(30.0));
    assert!(canvas.gesture().dragging_items());
    assert_eq!(graph.history().open_depth(), 1);

    canvas.pointer_move(&mut graph, at(Pos2::new(120.0, 50.0), 40.0));
    assert_eq!(graph.node(a).unwrap().pos, [60.0, 10.0]);
    canvas.pointer_up(&mut graph, at(Pos2::new(120.0, 50.0), 50.0));
    assert!(canvas.gesture().is_idle());
    assert_eq!(graph.history().open_depth(), 0);
    assert_eq!(graph.history().undo_depth(), 1);
}

#[test]
fn test_new_link_on_selected_node_is_highlighted() {
    let (mut graph, a, _, _) = scene();
    let (mut canvas, _) = canvas();
    click(&mut canvas, &mut graph, Pos2::new(60.0, 40.0), 0.0, Modifiers::NONE);
    assert!(canvas.selection().is_selected(ItemId::Node(a)));

    drag(&mut canvas, &mut graph, A_OUT, B_IN, 1000.0, Modifiers::NONE);

    let link = graph.links().next().unwrap().id;
    assert!(canvas.selection().is_link_highlighted(link));
}

#[test]
fn test_paste_with_shift_keeps_links_from_outside() {
    let (mut graph, _, b, _) = linked_scene();
    let (mut canvas, _) = canvas();
    click(&mut canvas, &mut graph, Pos2::new(460.0, 40.0), 0.0, Modifiers::NONE);
    assert!(canvas.selection().is_selected(ItemId::Node(b)));
    assert!(canvas.key_down(&mut graph, Key::C, Modifiers::CTRL));

    canvas.pointer_move(&mut graph, at(Pos2::new(300.0, 500.0), 100.0));
    let keep = Modifiers {
        ctrl: true,
        shift: true,
        ..Modifiers::NONE
    };
    assert!(canvas.key_down(&mut graph, Key::V, keep));
    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.link_count(), 2);

    assert!(canvas.key_down(&mut graph, Key::V, Modifiers::CTRL));
    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.link_count(), 2);
}
