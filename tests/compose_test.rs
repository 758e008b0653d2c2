use std::sync::Arc;

use regler::{
    Arg, BinOp, ControlBinding, ControlMap, EngineRef, Error, InputFader, OfflineEngine,
    Resolution, Scale, Sig, SigTo, SignalNode, Value,
};

fn engine() -> (Arc<OfflineEngine>, EngineRef) {
    let e = OfflineEngine::new(2);
    let eref: EngineRef = e.clone();
    (e, eref)
}

#[test]
fn sig_broadcasts_a_list_into_channels() {
    let (_e, eref) = engine();
    let a = Sig::new(&eref, vec![1.0, 2.0, 3.0]).unwrap();
    assert_eq!(a.channel_count(), 3);
    assert_eq!(a.current_all().unwrap(), vec![1.0, 2.0, 3.0]);
    assert_eq!(a.current().unwrap(), 1.0);
}

#[test]
fn attrs_broadcast_with_wrapping() {
    let (_e, eref) = engine();
    // mul has 2 entries, value has 3: mul wraps
    let a = Sig::with_attrs(
        &eref,
        Arg::from(vec![1.0, 2.0, 3.0]),
        Arg::from(vec![10.0, 100.0]),
        Arg::from(0.5),
    )
    .unwrap();
    assert_eq!(a.current_all().unwrap(), vec![10.5, 200.5, 30.5]);
}

#[test]
fn play_and_stop_are_idempotent() {
    let (e, eref) = engine();
    let mut a = Sig::new(&eref, 1.0).unwrap();
    a.play().unwrap().play().unwrap();
    assert!(e.is_playing(a.channel(0).unwrap()));
    a.stop().unwrap().stop().unwrap();
    assert!(!e.is_playing(a.channel(0).unwrap()));
}

#[test]
fn channel_index_out_of_range_is_an_error() {
    let (_e, eref) = engine();
    let a = Sig::new(&eref, vec![1.0, 2.0, 3.0]).unwrap();
    match a.channel(5) {
        Err(Error::ChannelOutOfRange { index: 5, count: 3 }) => {}
        other => panic!("expected out-of-range error, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn combine_builds_a_new_node_and_mutates_nothing() {
    let (_e, eref) = engine();
    let a = Sig::new(&eref, vec![1.0, 2.0, 3.0]).unwrap();
    let b = a.combine(BinOp::Mul, Arg::from(0.5)).unwrap();
    assert_eq!(b.current_all().unwrap(), vec![0.5, 1.0, 1.5]);
    // the operand is untouched
    assert_eq!(a.current_all().unwrap(), vec![1.0, 2.0, 3.0]);
    assert_eq!(a.channels().mul(), &Arg::Num(1.0));
    assert_eq!(a.channels().add(), &Arg::Num(0.0));
}

#[test]
fn combine_wraps_list_operands() {
    let (_e, eref) = engine();
    let a = Sig::new(&eref, vec![1.0, 2.0, 3.0]).unwrap();
    let b = a.combine(BinOp::Add, Arg::from(vec![10.0, 20.0])).unwrap();
    assert_eq!(b.current_all().unwrap(), vec![11.0, 22.0, 13.0]);
}

#[test]
fn combine_rev_lifts_plain_numbers() {
    let (_e, eref) = engine();
    let a = Sig::new(&eref, vec![1.0, 2.0]).unwrap();
    // 1 - a, not a - 1
    let b = a.combine_rev(BinOp::Sub, Arg::from(1.0)).unwrap();
    assert_eq!(b.current_all().unwrap(), vec![0.0, -1.0]);
    let c = a.combine_rev(BinOp::Div, Arg::from(4.0)).unwrap();
    assert_eq!(c.current_all().unwrap(), vec![4.0, 2.0]);
}

#[test]
fn mutate_replaces_the_receivers_attributes() {
    let (_e, eref) = engine();
    let mut a = Sig::new(&eref, 1.0).unwrap();
    a.mutate(BinOp::Mul, Arg::from(0.5)).unwrap();
    assert_eq!(a.current().unwrap(), 0.5);
    assert_eq!(a.channels().mul(), &Arg::Num(0.5));
    a.mutate(BinOp::Add, Arg::from(3.0)).unwrap();
    assert_eq!(a.current().unwrap(), 3.5);
}

#[test]
fn sub_and_div_use_inverse_sense() {
    let (_e, eref) = engine();
    let mut a = Sig::new(&eref, 2.0).unwrap();
    // signal - 5, stored in the add attribute
    a.set_sub(Arg::from(5.0)).unwrap();
    assert_eq!(a.current().unwrap(), -3.0);
    assert_eq!(a.channels().add(), &Arg::Num(5.0));

    let mut b = Sig::new(&eref, 10.0).unwrap();
    // signal / 4, stored in the mul attribute
    b.set_div(Arg::from(4.0)).unwrap();
    assert_eq!(b.current().unwrap(), 2.5);
    assert_eq!(b.channels().mul(), &Arg::Num(4.0));
}

#[test]
fn node_as_parameter_stays_live() {
    let (_e, eref) = engine();
    let mut s = Sig::new(&eref, 2.0).unwrap();
    let mut a = Sig::new(&eref, vec![1.0, 3.0]).unwrap();
    a.set_mul(s.as_arg()).unwrap();
    assert_eq!(a.current_all().unwrap(), vec![2.0, 6.0]);
    // the parameter reads the driving node's live value
    s.set_value(Arg::from(3.0)).unwrap();
    assert_eq!(a.current_all().unwrap(), vec![3.0, 9.0]);
}

#[test]
fn node_inside_a_list_reduces_to_its_first_channel() {
    let (_e, eref) = engine();
    let s = Sig::new(&eref, vec![2.0, 7.0]).unwrap();
    let mut a = Sig::new(&eref, vec![1.0, 3.0]).unwrap();
    a.set_mul(Arg::List(vec![
        Value::Num(5.0),
        Value::Node(s.node_ref()),
    ]))
    .unwrap();
    // channel 1 multiplies by s's first channel (2.0), not its second
    assert_eq!(a.current_all().unwrap(), vec![5.0, 6.0]);
}

#[test]
fn released_references_evaluate_as_silence() {
    let (_e, eref) = engine();
    let s = Sig::new(&eref, 5.0).unwrap();
    let mut a = Sig::new(&eref, 1.0).unwrap();
    a.set_mul(s.as_arg()).unwrap();
    assert_eq!(a.current().unwrap(), 5.0);
    drop(s);
    assert_eq!(a.current().unwrap(), 0.0);
}

#[test]
fn drop_releases_every_stream_exactly_once() {
    let (e, eref) = engine();
    let nref = {
        let a = Sig::new(&eref, vec![1.0, 2.0, 3.0]).unwrap();
        assert_eq!(e.live_streams(), 3);
        a.node_ref()
    };
    assert_eq!(e.live_streams(), 0);
    assert_eq!(e.double_releases(), 0);
    // a projection outliving its node is a reported error on read
    assert!(eref.get_value(nref.first()).is_err());
}

#[test]
fn mix_sums_round_robin_buckets() {
    let (_e, eref) = engine();
    let a = Sig::new(&eref, vec![1.0, 2.0, 3.0, 4.0]).unwrap();

    let down = a.mix(1).unwrap();
    assert_eq!(down.current_all().unwrap(), vec![10.0]);

    let same = a.mix(4).unwrap();
    assert_eq!(same.current_all().unwrap(), vec![1.0, 2.0, 3.0, 4.0]);

    // buckets 0..3 collect channels i % 3
    let three = a.mix(3).unwrap();
    assert_eq!(three.current_all().unwrap(), vec![5.0, 2.0, 3.0]);
}

#[test]
fn mix_clamps_voices() {
    let (_e, eref) = engine();
    let a = Sig::new(&eref, vec![1.0, 2.0]).unwrap();
    assert_eq!(a.mix(0).unwrap().channel_count(), 1);
    assert_eq!(a.mix(99).unwrap().channel_count(), 2);
}

#[test]
fn out_routes_with_wrapping() {
    let (e, eref) = engine();
    let a = Sig::new(&eref, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let mut c = a.combine(BinOp::Add, Arg::from(0.0)).unwrap();
    c.out(0, 1).unwrap();
    // 4 channels onto a 2-channel device: 0, 1, 0, 1
    let routes: Vec<usize> = (0..4)
        .map(|i| e.routing(c.channel(i).unwrap()).unwrap())
        .collect();
    assert_eq!(routes, vec![0, 1, 0, 1]);
    assert!(e.is_playing(c.channel(0).unwrap()));

    // stepping by 2 from channel 1 always lands on output 1
    c.out(1, 2).unwrap();
    for i in 0..4 {
        assert_eq!(e.routing(c.channel(i).unwrap()), Some(1));
    }
}

#[test]
fn negative_out_channel_scrambles_the_assignment() {
    let (e, eref) = engine();
    let a = Sig::new(&eref, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
    let mut c = a.combine(BinOp::Add, Arg::from(0.0)).unwrap();
    c.out(-1, 1).unwrap();
    let mut routes: Vec<usize> = (0..4)
        .map(|i| e.routing(c.channel(i).unwrap()).unwrap())
        .collect();
    routes.sort_unstable();
    assert_eq!(routes, vec![0, 0, 1, 1]);
}

#[test]
fn value_nodes_cannot_be_routed() {
    let (_e, eref) = engine();
    let mut a = Sig::new(&eref, 1.0).unwrap();
    match a.out(0, 1) {
        Err(Error::NotRoutable) => {}
        other => panic!("expected NotRoutable, got {:?}", other.map(|_| ())),
    }
    let mut s = SigTo::new(&eref, 1.0, 0.025, 1.0).unwrap();
    assert!(matches!(s.out(0, 1), Err(Error::NotRoutable)));
    // play without routing is still allowed
    a.play().unwrap();
}

#[test]
fn sigto_tracks_target_and_ramp_time() {
    let (e, eref) = engine();
    let mut s = SigTo::new(&eref, vec![1.0, 2.0], 0.05, 0.0).unwrap();
    assert_eq!(s.channel_count(), 2);
    assert_eq!(s.current_all().unwrap(), vec![1.0, 2.0]);
    s.set_value(Arg::from(5.0)).unwrap();
    assert_eq!(s.current_all().unwrap(), vec![5.0, 5.0]);
    s.set_time(Arg::from(0.5)).unwrap();
    assert_eq!(e.ramp_time(s.channel(0).unwrap()), Some(0.5));
    assert_eq!(s.time(), &Arg::Num(0.5));
}

#[test]
fn set_param_covers_the_node_vocabulary() {
    let (_e, eref) = engine();
    let mut s = Sig::new(&eref, 1.0).unwrap();
    s.set_param("value", Arg::from(4.0)).unwrap();
    s.set_param("mul", Arg::from(2.0)).unwrap();
    assert_eq!(s.current().unwrap(), 8.0);
    match s.set_param("cutoff", Arg::from(1.0)) {
        Err(Error::UnknownParam(name)) => assert_eq!(name, "cutoff"),
        other => panic!("expected UnknownParam, got {:?}", other),
    }

    let mut t = SigTo::new(&eref, 1.0, 0.025, 1.0).unwrap();
    t.set_param("time", Arg::from(0.1)).unwrap();
    assert_eq!(t.time(), &Arg::Num(0.1));
}

#[test]
fn input_fader_swaps_sources() {
    let (_e, eref) = engine();
    let a = Sig::new(&eref, vec![1.0, 2.0]).unwrap();
    let mut f = InputFader::new(&a).unwrap();
    assert_eq!(f.channel_count(), 2);
    assert_eq!(f.current_all().unwrap(), vec![1.0, 2.0]);

    let b = Sig::new(&eref, vec![5.0, 6.0, 7.0]).unwrap();
    f.set_input(&b, 0.05).unwrap();
    // the fader keeps its own channel count
    assert_eq!(f.current_all().unwrap(), vec![5.0, 6.0]);

    // a mono input wraps across both fader channels
    let mono = Sig::new(&eref, 9.0).unwrap();
    f.set_input(&mono, 0.05).unwrap();
    assert_eq!(f.current_all().unwrap(), vec![9.0, 9.0]);
}

#[test]
fn dump_names_the_type_and_channels() {
    let (_e, eref) = engine();
    let a = Sig::new(&eref, vec![1.0, 2.0]).unwrap();
    let d = a.dump();
    assert!(d.contains("Sig"), "{}", d);
    assert!(d.contains("2 channel(s)"), "{}", d);
}

#[test]
fn control_binding_drives_parameters_through_maps() {
    let (_e, eref) = engine();
    let mut node = Sig::new(&eref, 2.0).unwrap();
    let value = ControlMap::scalar(0.0, 10.0, Scale::Lin, "value", 2.0);
    let mut binding =
        ControlBinding::bind(&eref, &mut node, vec![ControlMap::mul(1.0), value]).unwrap();

    assert_eq!(binding.descriptors().count(), 2);
    assert_eq!(binding.value("mul"), Some(&[1.0][..]));
    // the initial mul of 1.0 leaves the value unchanged
    assert_eq!(node.current().unwrap(), 2.0);

    // slider at 0.25 on the 0..2 linear mul map
    let real = binding.set_norm("mul", &[0.25]).unwrap();
    assert_eq!(real, vec![0.5]);
    assert_eq!(node.current().unwrap(), 1.0);
    assert_eq!(binding.value("mul"), Some(&[0.5][..]));

    assert!(matches!(
        binding.set_norm("cutoff", &[0.5]),
        Err(Error::UnknownParam(_))
    ));
}

#[test]
fn integer_resolution_rounds_before_pushing() {
    let (_e, eref) = engine();
    let mut node = Sig::new(&eref, 0.0).unwrap();
    let steps = ControlMap::new(
        0.0,
        10.0,
        Scale::Lin,
        "value",
        vec![0.0],
        Resolution::Int,
        0.025,
    );
    let mut binding = ControlBinding::bind(&eref, &mut node, vec![steps]).unwrap();
    let real = binding.set_norm("value", &[0.52]).unwrap();
    assert_eq!(real, vec![5.0]);
    assert_eq!(node.current().unwrap(), 5.0);
}

#[test]
fn unbind_freezes_the_last_values() {
    let (e, eref) = engine();
    let mut node = Sig::new(&eref, 2.0).unwrap();
    let mut binding = ControlBinding::bind(&eref, &mut node, vec![ControlMap::mul(1.0)]).unwrap();
    binding.set_norm("mul", &[0.25]).unwrap();
    assert_eq!(node.current().unwrap(), 1.0);

    let before = e.live_streams();
    binding.unbind(&mut node).unwrap();
    // the backing ramped node is gone, the value stays
    assert!(e.live_streams() < before);
    assert_eq!(node.current().unwrap(), 1.0);
    assert_eq!(node.channels().mul(), &Arg::List(vec![Value::Num(0.5)]));
}
