#[cfg(test)]
mod integration_tests {
    use gpulist::registry::memory::{AcceleratorNode, DeviceNode, Handle, MemoryRegistry};
    use gpulist::EnumerationConfig;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::io::{self, Write};
    use std::rc::Rc;

    /// Writer that appends into a buffer shared with other writers
    #[derive(Clone, Default)]
    struct SharedSink(Rc<RefCell<Vec<u8>>>);

    impl Write for SharedSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.borrow_mut().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn run(sysname: &str, registry: &MemoryRegistry) -> (String, String, usize) {
        let mut out = Vec::new();
        let mut diag = Vec::new();
        let count = gpulist::report(
            sysname,
            registry,
            &EnumerationConfig::default(),
            &mut out,
            &mut diag,
        )
        .unwrap();
        (
            String::from_utf8(out).unwrap(),
            String::from_utf8(diag).unwrap(),
            count,
        )
    }

    #[test]
    fn test_library_version() {
        assert!(!gpulist::version().is_empty());
    }

    #[test]
    fn test_api_compilation() {
        // Test that API compiles and runs without panicking
        let _ = gpulist::list_devices();
        let _ = gpulist::is_supported();
    }

    #[test]
    fn test_empty_registry() {
        let registry = MemoryRegistry::new();
        assert_eq!(run("Darwin", &registry), (String::new(), String::new(), 0));
    }

    #[test]
    fn test_apple_m1() {
        let registry = MemoryRegistry::new()
            .with_accelerator(AcceleratorNode::new(0x118000000, DeviceNode::with_model("Apple M1")));

        let (out, diag, count) = run("Darwin", &registry);
        assert_eq!(
            out,
            "Device:                                 Apple M1 - ID: 0x118000000\n"
        );
        assert_eq!(diag, "");
        assert_eq!(count, 1);
    }

    #[test]
    fn test_unresolvable_parent() {
        let registry = MemoryRegistry::new().with_accelerator(AcceleratorNode::orphan(0x1000));

        let (out, _, count) = run("Darwin", &registry);
        assert_eq!(out, "");
        assert_eq!(count, 0);
        assert_eq!(registry.release_count(Handle::Accelerator(0)), 1);
        assert_eq!(registry.outstanding(), 0);
    }

    #[test]
    fn test_foreign_platform_still_enumerates() {
        let registry = MemoryRegistry::new()
            .with_accelerator(AcceleratorNode::new(0x1f, DeviceNode::with_model("Radeon Pro 560X")))
            .with_accelerator(AcceleratorNode::new(0x20, DeviceNode::with_model("Intel UHD Graphics 630")));

        let (out, diag, count) = run("Linux", &registry);
        assert_eq!(diag, "This command is only supported on macOS");
        assert_eq!(count, 2);
        assert_eq!(
            out,
            "Device:                          Radeon Pro 560X - ID: 0x1f\n\
             Device:                   Intel UHD Graphics 630 - ID: 0x20\n"
        );
    }

    #[test]
    fn test_every_handle_released_once() {
        let registry = MemoryRegistry::new()
            .with_accelerator(AcceleratorNode::new(1, DeviceNode::with_model("A")))
            .with_accelerator(AcceleratorNode::without_id(DeviceNode::with_model("B")))
            .with_accelerator(AcceleratorNode::orphan(3))
            .with_accelerator(AcceleratorNode::new(4, DeviceNode::without_properties()));

        let (_, _, count) = run("Darwin", &registry);
        assert_eq!(count, 1);
        assert_eq!(registry.outstanding(), 0);

        for index in 0..4 {
            assert_eq!(registry.release_count(Handle::Accelerator(index)), 1);
        }
        assert_eq!(registry.release_count(Handle::Parent(0)), 1);
        assert_eq!(registry.release_count(Handle::Parent(1)), 0);
        assert_eq!(registry.release_count(Handle::Parent(3)), 1);
        assert_eq!(registry.release_count(Handle::Properties(0)), 1);
        assert_eq!(registry.release_count(Handle::Iterator), 1);
    }

    #[test]
    fn test_warning_precedes_device_lines() {
        let registry = MemoryRegistry::new()
            .with_accelerator(AcceleratorNode::new(0x118000000, DeviceNode::with_model("Apple M1")));
        let sink = SharedSink::default();
        let mut out = sink.clone();
        let mut diag = sink.clone();

        let count = gpulist::report(
            "Linux",
            &registry,
            &EnumerationConfig::default(),
            &mut out,
            &mut diag,
        )
        .unwrap();

        assert_eq!(count, 1);
        assert_eq!(
            String::from_utf8(sink.0.borrow().clone()).unwrap(),
            "This command is only supported on macOS\
             Device:                                 Apple M1 - ID: 0x118000000\n"
        );
    }
}
