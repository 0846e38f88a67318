use indoc::indoc;
use rstest::rstest;
use serde::de::DeserializeOwned;
use workspace_template::{
    PluginOverrides, TemplateSpec, TemplateSpecContent,
    layers::{self, Plugin, compose, merge_layers},
    substitution::substitute_attributes,
    yaml::{self, Format},
};

fn decode<T: DeserializeOwned>(input: &str) -> T {
    yaml::decode(input).expect("test document is valid")
}

fn parent() -> TemplateSpecContent {
    decode(indoc! {"
        attributes:
          nodeVersion: '16'
          registry: docker.io
        components:
          - name: runtime
            container:
              image: '{{registry}}/node'
              memoryLimit: 512Mi
        commands:
          - id: install
            exec:
              component: runtime
              commandLine: npm install
          - id: run
            exec:
              component: runtime
              commandLine: node server.js
        events:
          postStart: [install]
    "})
}

fn plugin() -> TemplateSpecContent {
    decode(indoc! {"
        attributes:
          registry: quay.io
          editor: theia
        components:
          - name: editor
            container:
              image: theia:next
              memoryLimit: 256Mi
        commands:
          - id: open-editor
            exec:
              component: editor
              commandLine: theia start --version {{nodeVersion}}
        events:
          postStart: [open-editor]
    "})
}

#[test]
fn compose_full_workspace() {
    let main = decode::<TemplateSpec>(indoc! {"
        parent:
          id: nodejs
          registryUrl: https://registry.example.com
          attributes:
            nodeVersion: '18'
          commands:
            - id: run
              exec:
                commandLine: node --inspect server.js
        attributes:
          registry: ghcr.io
        projects:
          - name: web
            git:
              remotes:
                origin: https://github.com/example/web.git
        commands:
          - id: test
            exec:
              component: runtime
              commandLine: npm test
        events:
          preStop: [test]
    "});
    let plugin_content = plugin();
    let plugin_overrides = decode::<PluginOverrides>(indoc! {"
        components:
          - name: editor
            container:
              memoryLimit: 1Gi
    "});

    let merged = compose(&main, Some(&parent()), &[Plugin {
        name: "theia",
        content: &plugin_content,
        overrides: Some(&plugin_overrides),
    }])
    .unwrap();
    let resolved = substitute_attributes(&merged).unwrap();

    // Substitution does not touch images
    assert_eq!(
        yaml::to_string(&resolved, Format::Yaml).unwrap(),
        indoc! {"
            ---
            attributes:
              editor: theia
              nodeVersion: '18'
              registry: ghcr.io
            components:
            - name: editor
              container:
                image: theia:next
                memoryLimit: 1Gi
            - name: runtime
              container:
                image: '{{registry}}/node'
                memoryLimit: 512Mi
            projects:
            - name: web
              git:
                remotes:
                  origin: https://github.com/example/web.git
            commands:
            - id: open-editor
              exec:
                commandLine: theia start --version 18
                component: editor
            - id: install
              exec:
                commandLine: npm install
                component: runtime
            - id: run
              exec:
                commandLine: node --inspect server.js
                component: runtime
            - id: test
              exec:
                commandLine: npm test
                component: runtime
            events:
              postStart:
              - install
              - open-editor
              preStop:
              - test
        "}
    );
}

#[rstest]
#[case::two_plugins(vec![plugin(), plugin()], None)]
#[case::parent_and_plugin(vec![plugin()], Some(parent()))]
#[case::nothing(vec![], None)]
fn merge_is_symmetric_for_disjoint_layers(
    #[case] plugins: Vec<TemplateSpecContent>,
    #[case] parent: Option<TemplateSpecContent>,
) {
    let main = decode::<TemplateSpecContent>("commands: [{id: main, exec: {commandLine: make}}]");
    let forward = merge_layers(&main, parent.as_ref(), &plugins).unwrap();

    let mut reversed_plugins = plugins.clone();
    reversed_plugins.reverse();
    let reversed = merge_layers(&main, parent.as_ref(), &reversed_plugins).unwrap();

    // Identical plugins are deduplicated, so the order of plugins does not matter here
    assert_eq!(forward.commands, reversed.commands);
    assert_eq!(forward.events, reversed.events);
    assert!(forward.commands.iter().any(|command| command.id == "main"));
}

#[test]
fn conflicting_plugins_are_reported() {
    let mut other = plugin();
    other.attributes.clear();
    other.components.clear();
    if let Some(command) = other.commands.first_mut() {
        command.attributes.insert("fork".to_string(), "true".to_string());
    }

    let err = merge_layers(&TemplateSpecContent::default(), None, &[plugin(), other]).unwrap_err();
    assert_eq!(
        err,
        layers::Error::LayerCollision {
            kind: "command",
            key: "open-editor".to_string(),
            first: "plugin #0".to_string(),
            second: "plugin #1".to_string(),
        }
    );
}
