//! Built-in scenario catalog.
//!
//! Each scenario pairs an excerpt of old documentation with the changelog
//! that superseded it. The catalog is read-only and built once at startup.

use std::collections::BTreeMap;

use serde::Serialize;

use docdrift_core::models::SourceDoc;

/// Provenance label attached to every chunk of a scenario's old document.
pub const OLD_SOURCE: &str = "Old_Documentation.txt";
/// Provenance label attached to every chunk of a scenario's new document.
pub const NEW_SOURCE: &str = "New_Changelog.txt";

/// A named old/new document pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    pub id: String,
    pub old_text: String,
    pub new_text: String,
}

impl Scenario {
    pub fn new(
        id: impl Into<String>,
        old_text: impl Into<String>,
        new_text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            old_text: old_text.into(),
            new_text: new_text.into(),
        }
    }

    /// The two documents in indexing order: old first, then new.
    pub fn documents(&self) -> [SourceDoc; 2] {
        [
            SourceDoc::new(OLD_SOURCE, self.old_text.as_str()),
            SourceDoc::new(NEW_SOURCE, self.new_text.as_str()),
        ]
    }
}

/// Listing entry returned by `GET /scenarios`.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioSummary {
    pub id: String,
    pub old_source: &'static str,
    pub new_source: &'static str,
}

/// Read-only mapping from scenario id to its document pair.
#[derive(Debug, Clone, Default)]
pub struct ScenarioCatalog {
    scenarios: BTreeMap<String, Scenario>,
}

impl ScenarioCatalog {
    /// The catalog shipped with the binary.
    pub fn builtin() -> Self {
        Self::from_scenarios(
            BUILTIN
                .iter()
                .map(|(id, old, new)| Scenario::new(*id, *old, *new)),
        )
    }

    /// Build a catalog from arbitrary scenarios. Later duplicates win.
    pub fn from_scenarios(scenarios: impl IntoIterator<Item = Scenario>) -> Self {
        Self {
            scenarios: scenarios
                .into_iter()
                .map(|s| (s.id.clone(), s))
                .collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.get(id)
    }

    /// Scenario ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.scenarios.keys().map(String::as_str)
    }

    pub fn summaries(&self) -> Vec<ScenarioSummary> {
        self.ids()
            .map(|id| ScenarioSummary {
                id: id.to_string(),
                old_source: OLD_SOURCE,
                new_source: NEW_SOURCE,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.scenarios.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }
}

/// `(id, old documentation, new changelog)`
const BUILTIN: &[(&str, &str, &str)] = &[
    (
        "stripe",
        r##"STRIPE API REFERENCE v2020-08-27

1. CHARGES API
To charge a card, use the Charge object.
POST /v1/charges
Params:
- amount: Integer
- source: Card ID (e.g., tok_visa)

2. API KEYS
Your API keys are located in the dashboard.
Publishable keys start with 'pk_live_'.
Secret keys start with 'sk_live_'.
You can embed your Secret Key in your mobile app code for easy access."##,
        r##"STRIPE API CHANGELOG v2024-01-01

CRITICAL SECURITY & API UPDATES:

1. Charges API Deprecated
The /v1/charges endpoint is removed. You must migrate to /v1/payment_intents.
The 'source' parameter is no longer supported; use 'payment_method' instead.

2. API Key Security (Breaking Change)
Embedding Secret Keys (sk_live_) in client-side code (mobile apps/frontend) is now strictly prohibited and will cause immediate account suspension.
You must proxy requests through a backend server."##,
    ),
    (
        "react",
        r##"REACT DOM v17

1. Rendering
To render an app, use the render method:
import ReactDOM from 'react-dom';
ReactDOM.render(<App />, document.getElementById('root'));

2. Event Delegation
React attaches event listeners to the `document` node.
Stopping propagation (e.stopPropagation) prevents the event from reaching the document."##,
        r##"REACT DOM v18 CHANGELOG

1. New Root API
ReactDOM.render is deprecated. Using it will warn in the console and run in compatibility mode.
You must use `ReactDOM.createRoot`:
import { createRoot } from 'react-dom/client';
const root = createRoot(container);
root.render(<App />);

2. Event Delegation Update
React no longer attaches events to `document`.
Events are now attached to the root DOM container (div#root)."##,
    ),
    (
        "nextjs",
        r##"NEXT.JS v12 (PAGES ROUTER)

1. Data Fetching
Use `getStaticProps` or `getServerSideProps` inside your 'pages/' files to fetch data.

2. Link Component
The <Link> component requires a child <a> tag:
<Link href="/about">
  <a>About Us</a>
</Link>"##,
        r##"NEXT.JS v14 (APP ROUTER)

1. Data Fetching
`getStaticProps` and `getServerSideProps` are removed in the 'app' directory.
Use standard `await fetch()` in your Server Components.

2. Link Component Update
The <Link> component no longer requires a child <a> tag.
Passing an <a> tag as a child is now invalid and causes hydration errors.
Usage: <Link href="/about">About Us</Link>"##,
    ),
    (
        "aws_s3",
        r##"AWS SDK JS v2

1. Instantiation
var s3 = new AWS.S3({ region: 'us-west-1' });

2. Uploads
s3.upload({Bucket: 'b', Key: 'k', Body: f}, function(err, data) { ... });

3. Global Config
AWS.config.update({ accessKeyId: '...', secretAccessKey: '...' });"##,
        r##"AWS SDK JS v3

1. Modular Imports (Breaking)
Global 'AWS' namespace is removed. You must import { S3Client } from "@aws-sdk/client-s3".

2. Uploads
The `.upload()` method is removed from the client.
You must use the `@aws-sdk/lib-storage` package or `PutObjectCommand`.

3. Configuration
Global configuration `AWS.config.update` is removed.
Configuration must be passed explicitly to the Client constructor."##,
    ),
    (
        "python",
        r##"PYTHON 2.7

1. Print
print "Hello World"

2. Integer Division
In Python 2, dividing two integers performs floor division:
5 / 2 # Returns 2"##,
        r##"PYTHON 3.x

1. Print Function
`print` is now a function. `print "Hello"` raises a SyntaxError.
Use `print("Hello")`.

2. True Division
The `/` operator now performs float division:
5 / 2 # Returns 2.5
Use `//` for floor division."##,
    ),
    (
        "openai",
        r##"OPENAI PYTHON v0.28

1. Setup
import openai
openai.api_key = "sk-..."

2. Fine-tuning
response = openai.FineTune.create(training_file="file-id")"##,
        r##"OPENAI PYTHON v1.0

1. Client Instantiation
Global setup is removed.
client = OpenAI(api_key="sk-...")

2. Fine-tuning API Renamed
`openai.FineTune` is removed.
Use `client.fine_tuning.jobs.create(...)` instead."##,
    ),
    (
        "tailwind",
        r##"TAILWIND v2

1. Dark Mode
darkMode: 'class'

2. Purge
Configure the `purge` option to remove unused styles:
purge: ['./src/**/*.js']"##,
        r##"TAILWIND v3

1. Dark Mode
'class' strategy is deprecated. Use 'selector'.

2. Content (Breaking)
The `purge` option has been renamed to `content`.
Using `purge` will throw a warning and may be ignored in v4."##,
    ),
    (
        "kubernetes",
        r##"KUBERNETES v1.19

1. Ingress
apiVersion: networking.k8s.io/v1beta1
kind: Ingress

2. Docker
Kubernetes uses Dockershim to communicate with Docker Engine."##,
        r##"KUBERNETES v1.25

1. Ingress API Upgrade
networking.k8s.io/v1beta1 is removed. You must use `networking.k8s.io/v1`.

2. Dockershim Removed
Dockershim is deleted. Docker Engine is no longer a supported runtime.
Use containerd."##,
    ),
    (
        "github_actions",
        r##"GITHUB ACTIONS v1

1. Set Output
echo "::set-output name=my_var::value"

2. Save State
echo "::save-state name=my_state::value""##,
        r##"GITHUB ACTIONS v3

DEPRECATION NOTICE:
1. set-output is disabled.
Write to $GITHUB_OUTPUT instead: echo "my_var=value" >> $GITHUB_OUTPUT

2. save-state is disabled.
Write to $GITHUB_STATE instead: echo "my_state=value" >> $GITHUB_STATE"##,
    ),
    (
        "flutter",
        r##"FLUTTER v2

1. Back Button
WillPopScope(onWillPop: ...)

2. Theme Buttons
FlatButton and RaisedButton are standard."##,
        r##"FLUTTER v3.12

1. PopScope
WillPopScope is deprecated. Use PopScope.

2. Button Migration
FlatButton and RaisedButton are removed classes.
Use TextButton and ElevatedButton respectively."##,
    ),
];
